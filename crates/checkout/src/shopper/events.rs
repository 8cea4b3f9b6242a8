use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a shopper index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShopperEvent {
    /// A new cart became the user's open cart.
    CartAssigned(CartAssignedData),

    /// The open cart was checked out into an order.
    CartClosed(ShopperCartClosedData),
}

impl DomainEvent for ShopperEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShopperEvent::CartAssigned(_) => "ShopperCartAssigned",
            ShopperEvent::CartClosed(_) => "ShopperCartClosed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartAssignedData {
    pub user: UserId,
    pub cart_id: AggregateId,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopperCartClosedData {
    pub cart_id: AggregateId,
    pub order_id: AggregateId,
    pub closed_at: DateTime<Utc>,
}
