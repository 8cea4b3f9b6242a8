//! Cart total derivation.

use serde::{Deserialize, Serialize};

use super::LineItem;
use crate::money::Money;

/// Cart-level totals derived from the line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line subtotals.
    pub final_price: Money,
    /// Sum of line quantities.
    pub final_quantity: u64,
}

/// Recomputes a cart's totals from its line items.
///
/// This is the only place the totals are computed. It is a pure function:
/// an empty slice gives zero for both, and calling it twice on the same
/// items gives the same result.
pub fn recount(items: &[LineItem]) -> CartTotals {
    items.iter().fold(CartTotals::default(), |totals, item| CartTotals {
        final_price: totals.final_price + item.subtotal(),
        final_quantity: totals.final_quantity + u64::from(item.quantity()),
    })
}
