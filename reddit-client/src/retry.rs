use std::time::Duration;
use votelens_core::{ErrorExt, RedditApiError};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Fixed pause before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reddit()
    }
}

impl RetryPolicy {
    pub fn reddit() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(5),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// `attempt` is zero-based: 0 is the first request.
    pub fn decide(&self, attempt: u32, error: &RedditApiError) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::GiveUp;
        }
        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.delay)
    }

    /// The error reported once the loop stops retrying.
    pub fn final_error(&self, attempt: u32, error: RedditApiError) -> RedditApiError {
        if error.is_retryable() {
            RedditApiError::RetriesExhausted {
                attempts: attempt + 1,
                last_error: error.to_string(),
            }
        } else {
            error
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}
