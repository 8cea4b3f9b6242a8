//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::cart::{CartTotals, LineItem};
use crate::money::Money;

use super::{OrderDetails, OrderError, OrderEvent, OrderPlacedData};

/// Order aggregate root.
///
/// Created by a single `OrderPlaced` event in the same commit that closes
/// its cart, and never changed afterwards.
#[derive(Debug, Clone, Default)]
pub struct Order {
    id: Option<AggregateId>,
    version: Version,
    placed: Option<OrderPlacedData>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => {
                self.id = Some(data.order_id);
                self.placed = Some(data);
            }
        }
    }
}

// Query methods
impl Order {
    pub fn owner(&self) -> Option<UserId> {
        self.placed.as_ref().map(|p| p.owner)
    }

    /// The closed cart this order was placed from.
    pub fn cart_id(&self) -> Option<AggregateId> {
        self.placed.as_ref().map(|p| p.cart_id)
    }

    pub fn details(&self) -> Option<&OrderDetails> {
        self.placed.as_ref().map(|p| &p.details)
    }

    /// Line items as they were at checkout.
    pub fn items(&self) -> &[LineItem] {
        self.placed
            .as_ref()
            .map(|p| p.items.as_slice())
            .unwrap_or_default()
    }

    pub fn totals(&self) -> CartTotals {
        self.placed.as_ref().map(|p| p.totals).unwrap_or_default()
    }

    pub fn final_price(&self) -> Money {
        self.totals().final_price
    }

    pub fn final_quantity(&self) -> u64 {
        self.totals().final_quantity
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.placed.as_ref().map(|p| p.created_at)
    }
}

// Command methods (return events)
impl Order {
    /// Records the order. `snapshot.items` must be the checked-out cart's
    /// lines and `snapshot.totals` their recount.
    pub fn place(&self, snapshot: OrderPlacedData) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }
        if snapshot.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        Ok(vec![OrderEvent::OrderPlaced(snapshot)])
    }
}
