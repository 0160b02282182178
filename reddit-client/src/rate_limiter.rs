use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const RATE_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_RESET_HEADER: &str = "x-ratelimit-reset";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 60,
            time_window: Duration::from_secs(60),
        }
    }

    fn window_secs(&self) -> u64 {
        self.time_window.as_secs().max(1)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::reddit_oauth()
    }
}

/// Rate limit values reported by Reddit on a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    pub remaining: Option<f64>,
    pub reset_secs: Option<u64>,
}

impl RateLimitHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value >= 0.0)
        };

        Self {
            remaining: read(RATE_REMAINING_HEADER),
            reset_secs: read(RATE_RESET_HEADER).map(|v| v as u64),
        }
    }
}

/// Request counter for the current rate window.
///
/// A window is considered over when the server-reported reset countdown
/// grows instead of shrinking.
#[derive(Debug)]
pub struct RateWindow {
    config: RateLimitConfig,
    used: u32,
    reset_secs: u64,
    server_remaining: Option<f64>,
}

impl RateWindow {
    pub fn new(config: RateLimitConfig) -> Self {
        let reset_secs = config.window_secs();
        Self {
            config,
            used: 0,
            reset_secs,
            server_remaining: None,
        }
    }

    pub fn record_response(&mut self, headers: &RateLimitHeaders) {
        if let Some(reset) = headers.reset_secs {
            let reset = reset % self.config.window_secs();
            if reset > self.reset_secs {
                tracing::debug!("Rate window rolled over, resetting request counter");
                self.used = 0;
            }
            self.reset_secs = reset;
        }

        self.used += 1;
        self.server_remaining = headers.remaining;
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.config.max_requests
            || self.server_remaining.is_some_and(|remaining| remaining < 1.0)
    }

    /// How long to sleep before the next request, if the budget is spent.
    pub fn wait_needed(&self) -> Option<Duration> {
        self.is_exhausted()
            .then(|| Duration::from_secs(self.reset_secs))
    }

    pub fn start_new_window(&mut self) {
        self.used = 0;
        self.server_remaining = None;
        self.reset_secs = self.config.window_secs();
    }

    pub fn status(&self) -> RateLimitStatus {
        RateLimitStatus {
            used: self.used,
            max_requests: self.config.max_requests,
            reset_secs: self.reset_secs,
            server_remaining: self.server_remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub used: u32,
    pub max_requests: u32,
    pub reset_secs: u64,
    pub server_remaining: Option<f64>,
}

impl RateLimitStatus {
    pub fn requests_remaining_in_window(&self) -> u32 {
        self.max_requests.saturating_sub(self.used)
    }
}
