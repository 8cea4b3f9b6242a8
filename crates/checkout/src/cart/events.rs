//! Cart domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::catalog::{Product, ProductId};
use crate::money::Money;

use super::{CartTotals, LineItem, LineItemId};

/// Events that can occur on a cart aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// Cart was created for a user.
    CartOpened(CartOpenedData),

    /// A product was put in the cart for the first time.
    LineItemAdded(LineItemAddedData),

    /// A line's quantity or recorded price changed.
    LineItemQuantityChanged(LineItemQuantityChangedData),

    /// A line was taken out of the cart.
    LineItemRemoved(LineItemRemovedData),

    /// The cart was frozen into an order.
    CartCheckedOut(CartCheckedOutData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartOpened(_) => "CartOpened",
            CartEvent::LineItemAdded(_) => "LineItemAdded",
            CartEvent::LineItemQuantityChanged(_) => "LineItemQuantityChanged",
            CartEvent::LineItemRemoved(_) => "LineItemRemoved",
            CartEvent::CartCheckedOut(_) => "CartCheckedOut",
        }
    }
}

/// Data for CartOpened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartOpenedData {
    pub cart_id: AggregateId,
    pub owner: UserId,
    pub opened_at: DateTime<Utc>,
}

/// Data for LineItemAdded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemAddedData {
    pub line_item_id: LineItemId,
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub added_by: UserId,
}

/// Data for LineItemQuantityChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemQuantityChangedData {
    pub line_item_id: LineItemId,
    pub old_quantity: u32,
    pub new_quantity: u32,
    /// Catalog price at the time of the change.
    pub unit_price: Money,
}

/// Data for LineItemRemoved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRemovedData {
    pub line_item_id: LineItemId,
    pub product_id: ProductId,
}

/// Data for CartCheckedOut event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCheckedOutData {
    pub order_id: AggregateId,
    pub checked_out_at: DateTime<Utc>,
    /// Totals frozen at checkout.
    pub totals: CartTotals,
}

// Event constructors
impl CartEvent {
    pub fn cart_opened(cart_id: AggregateId, owner: UserId, opened_at: DateTime<Utc>) -> Self {
        CartEvent::CartOpened(CartOpenedData {
            cart_id,
            owner,
            opened_at,
        })
    }

    pub fn line_item_added(product: &Product, added_by: UserId) -> Self {
        CartEvent::LineItemAdded(LineItemAddedData {
            line_item_id: LineItemId::new(),
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.unit_price,
            quantity: 1,
            added_by,
        })
    }

    pub fn line_item_quantity_changed(line: &LineItem, new_quantity: u32, unit_price: Money) -> Self {
        CartEvent::LineItemQuantityChanged(LineItemQuantityChangedData {
            line_item_id: line.id(),
            old_quantity: line.quantity(),
            new_quantity,
            unit_price,
        })
    }

    pub fn line_item_removed(line: &LineItem) -> Self {
        CartEvent::LineItemRemoved(LineItemRemovedData {
            line_item_id: line.id(),
            product_id: line.product_id().clone(),
        })
    }

    pub fn cart_checked_out(
        order_id: AggregateId,
        checked_out_at: DateTime<Utc>,
        totals: CartTotals,
    ) -> Self {
        CartEvent::CartCheckedOut(CartCheckedOutData {
            order_id,
            checked_out_at,
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_payload_is_tagged() {
        let product = Product::new("SKU-1", "Mug", Money::from_cents(1000));
        let event = CartEvent::line_item_added(&product, UserId::new());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LineItemAdded");
        assert_eq!(json["data"]["product_id"], "SKU-1");
        assert_eq!(json["data"]["unit_price"], "10.00");
        assert_eq!(json["data"]["quantity"], 1);
        assert_eq!(event.event_type(), "LineItemAdded");
    }
}
