use std::time::Duration;

use assess_core::model::{FREE_TEXT_WORD_LIMIT, FallbackPolicy};

/// Tunables for running a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub word_limit: usize,
    /// Used when the server's start/duration cannot be fetched.
    pub fallback: FallbackPolicy,
    pub tick_period: Duration,
    pub results_poll_period: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            word_limit: FREE_TEXT_WORD_LIMIT,
            fallback: FallbackPolicy::default(),
            tick_period: Duration::from_secs(1),
            results_poll_period: Duration::from_secs(5),
        }
    }
}
