//! Shared identifier types for the storefront checkout workspace.

mod types;

pub use types::{AggregateId, UserId};
