//! Checkout error types.

use event_store::EventStoreError;
use serde::Serialize;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::order::OrderError;
use crate::shopper::ShopperError;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field-level validation failures, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failing field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns true if any error concerns `field`.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Ok when empty, otherwise the collected errors.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Errors surfaced by [`crate::CheckoutService`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input was rejected; nothing changed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The cart, line item, order or product does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation needs a logged-in user.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The acting user does not own the target.
    #[error("User {user} may not modify {entity} {id}")]
    Authorization {
        user: String,
        entity: &'static str,
        id: String,
    },

    /// The target is in a state that forbids the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// The catalog could not be read.
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Returns true for a lost optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckoutError::EventStore(e) if e.is_conflict())
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CheckoutError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<ValidationErrors> for CheckoutError {
    fn from(errors: ValidationErrors) -> Self {
        CheckoutError::Validation(errors)
    }
}

impl From<CatalogError> for CheckoutError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => CheckoutError::not_found("Product", id),
            CatalogError::InvalidPrice { product_id, .. } => CheckoutError::Validation(
                ValidationErrors::single("product", format!("{product_id} has no valid price")),
            ),
            other => CheckoutError::Catalog(other),
        }
    }
}

impl From<CartError> for CheckoutError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::AnonymousCart => CheckoutError::AuthenticationRequired,
            CartError::NotFound { cart_id } => CheckoutError::not_found("Cart", cart_id),
            CartError::NotOwner { user, cart_id } => CheckoutError::Authorization {
                user: user.to_string(),
                entity: "Cart",
                id: cart_id.to_string(),
            },
            CartError::NotLineOwner { user, line_item_id } => CheckoutError::Authorization {
                user: user.to_string(),
                entity: "LineItem",
                id: line_item_id.to_string(),
            },
            CartError::LineItemNotFound { line_item_id } => {
                CheckoutError::not_found("LineItem", line_item_id)
            }
            CartError::InvalidQuantity { quantity } => CheckoutError::Validation(
                ValidationErrors::single("quantity", format!("{quantity} is not a positive quantity")),
            ),
            CartError::QuantityOverflow => CheckoutError::Validation(ValidationErrors::single(
                "quantity",
                "quantity is too large",
            )),
            CartError::ProductUnavailable { product_id } => CheckoutError::Validation(
                ValidationErrors::single("product", format!("{product_id} is not available")),
            ),
            CartError::Empty => CheckoutError::Validation(ValidationErrors::single(
                "cart",
                "cannot place an order for an empty cart",
            )),
            e @ (CartError::Closed { .. } | CartError::AlreadyOpened) => {
                CheckoutError::InvalidState(e.to_string())
            }
        }
    }
}

impl From<OrderError> for CheckoutError {
    fn from(e: OrderError) -> Self {
        CheckoutError::InvalidState(e.to_string())
    }
}

impl From<ShopperError> for CheckoutError {
    fn from(e: ShopperError) -> Self {
        CheckoutError::InvalidState(e.to_string())
    }
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
