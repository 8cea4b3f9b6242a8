//! Per-user index of open and closed carts.
//!
//! The shopper stream is keyed by the user's id, so its optimistic version
//! check is what keeps a user at one open cart: two requests racing to open
//! a cart both expect the same shopper version and only one can commit.

mod aggregate;
mod events;

pub use aggregate::{ClosedCart, Shopper};
pub use events::{CartAssignedData, ShopperCartClosedData, ShopperEvent};

use common::{AggregateId, UserId};
use thiserror::Error;

/// Errors that can occur on the shopper index.
#[derive(Debug, Error)]
pub enum ShopperError {
    /// The user already has an open cart.
    #[error("User already has an open cart: {cart_id}")]
    CartAlreadyOpen { cart_id: AggregateId },

    /// The cart being closed is not the user's open cart.
    #[error("Cart {cart_id} is not the open cart of user {user}")]
    NotOpenCart { user: UserId, cart_id: AggregateId },
}

/// Stream id of a user's shopper index.
pub fn shopper_id(user: UserId) -> AggregateId {
    AggregateId::from_uuid(user.as_uuid())
}
