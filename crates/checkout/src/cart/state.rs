//! Cart lifecycle.

use serde::{Deserialize, Serialize};

/// The state of a cart.
///
/// ```text
/// Open ──► Closed
/// ```
///
/// A cart closes exactly once, when an order is placed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CartState {
    /// Line items can be added, removed and re-quantified.
    #[default]
    Open,

    /// Checked out into an order (terminal).
    Closed,
}

impl CartState {
    /// Returns true if line items can be modified.
    pub fn can_modify_items(&self) -> bool {
        matches!(self, CartState::Open)
    }

    /// Mirrors the storefront's `in_order` flag.
    pub fn in_order(&self) -> bool {
        matches!(self, CartState::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CartState::Open => "Open",
            CartState::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for CartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
