//! Checkout engine configuration.

/// Default number of times a command is re-run after losing a race.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 5;

/// Tunables for [`crate::CheckoutService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// How many times a command is retried after a concurrency conflict
    /// before the conflict is returned to the caller.
    pub max_conflict_retries: u32,
}

impl CheckoutConfig {
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}
