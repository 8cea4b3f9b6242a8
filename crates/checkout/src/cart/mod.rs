//! Shopping cart aggregate, line items and the recount engine.

mod aggregate;
mod events;
mod line_item;
mod recount;
mod state;

pub use aggregate::Cart;
pub use events::{
    CartCheckedOutData, CartEvent, CartOpenedData, LineItemAddedData,
    LineItemQuantityChangedData, LineItemRemovedData,
};
pub use line_item::{LineItem, LineItemId};
pub use recount::{CartTotals, recount};
pub use state::CartState;

use common::{AggregateId, UserId};
use thiserror::Error;

use crate::catalog::ProductId;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Anonymous carts are display-only.
    #[error("Anonymous carts cannot be modified")]
    AnonymousCart,

    /// The cart stream has no events.
    #[error("Cart not found: {cart_id}")]
    NotFound { cart_id: AggregateId },

    /// The cart was already opened.
    #[error("Cart already opened")]
    AlreadyOpened,

    /// The cart belongs to someone else.
    #[error("User {user} does not own cart {cart_id}")]
    NotOwner { user: UserId, cart_id: AggregateId },

    /// The line belongs to someone else.
    #[error("User {user} does not own line item {line_item_id}")]
    NotLineOwner {
        user: UserId,
        line_item_id: LineItemId,
    },

    /// The cart is checked out and frozen.
    #[error("Cart is closed: cannot {action}")]
    Closed { action: &'static str },

    /// No such line in this cart.
    #[error("Line item not found: {line_item_id}")]
    LineItemNotFound { line_item_id: LineItemId },

    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Quantity, or the cart total it implies, would exceed the supported
    /// maximum.
    #[error("Quantity overflow")]
    QuantityOverflow,

    /// The catalog marks the product as not sold.
    #[error("Product is not available: {product_id}")]
    ProductUnavailable { product_id: ProductId },

    /// Nothing to check out.
    #[error("Cart has no items")]
    Empty,
}

/// Narrows a caller-supplied quantity to a positive `u32`.
pub fn validate_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity <= 0 {
        return Err(CartError::InvalidQuantity { quantity });
    }
    u32::try_from(quantity).map_err(|_| CartError::QuantityOverflow)
}
