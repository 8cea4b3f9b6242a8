//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::cart::{CartTotals, LineItem};

use super::OrderDetails;

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed from a cart. The only event an order ever has.
    OrderPlaced(OrderPlacedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
        }
    }
}

/// Data for OrderPlaced event: everything the order will ever hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: AggregateId,
    pub owner: UserId,
    pub cart_id: AggregateId,
    pub details: OrderDetails,
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
    pub created_at: DateTime<Utc>,
}
