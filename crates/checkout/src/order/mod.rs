//! Orders: immutable snapshots of checked-out carts.

mod aggregate;
mod events;
mod form;

pub use aggregate::Order;
pub use events::{OrderEvent, OrderPlacedData};
pub use form::{BuyingType, OrderDetails, OrderForm};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Orders are written once.
    #[error("Order already placed")]
    AlreadyPlaced,

    /// An order needs at least one line.
    #[error("Order has no items")]
    NoItems,
}
