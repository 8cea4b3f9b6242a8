//! Commands accepted by [`crate::CheckoutService`].

use common::AggregateId;
use serde::Deserialize;

use crate::cart::LineItemId;
use crate::catalog::ProductId;
use crate::identity::Identity;
use crate::order::OrderForm;

/// Put one unit of a product in a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddItem {
    pub cart_id: AggregateId,
    pub product_id: ProductId,
    pub identity: Identity,
}

impl AddItem {
    pub fn new(cart_id: AggregateId, product_id: impl Into<ProductId>, identity: Identity) -> Self {
        Self {
            cart_id,
            product_id: product_id.into(),
            identity,
        }
    }
}

/// Take a line out of a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveItem {
    pub cart_id: AggregateId,
    pub line_item_id: LineItemId,
}

impl RemoveItem {
    pub fn new(cart_id: AggregateId, line_item_id: LineItemId) -> Self {
        Self {
            cart_id,
            line_item_id,
        }
    }
}

/// Set a line's quantity. Signed so non-positive input can be rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeQuantity {
    pub cart_id: AggregateId,
    pub line_item_id: LineItemId,
    pub quantity: i64,
    pub identity: Identity,
}

impl ChangeQuantity {
    pub fn new(
        cart_id: AggregateId,
        line_item_id: LineItemId,
        quantity: i64,
        identity: Identity,
    ) -> Self {
        Self {
            cart_id,
            line_item_id,
            quantity,
            identity,
        }
    }
}

/// Check a cart out into an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub cart_id: AggregateId,
    pub form: OrderForm,
    pub identity: Identity,
}

impl PlaceOrder {
    pub fn new(cart_id: AggregateId, form: OrderForm, identity: Identity) -> Self {
        Self {
            cart_id,
            form,
            identity,
        }
    }
}
