pub mod api;
pub mod auth;
pub mod rate_limiter;
pub mod retry;


pub use api::{RedditListing, RedditPostData, MAX_FULLNAMES_PER_LOOKUP};
pub use auth::TokenManager;
pub use rate_limiter::{RateLimitConfig, RateLimitStatus, RateWindow};
pub use retry::{RetryDecision, RetryPolicy};

use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use votelens_core::{ApiConfig, CoreError, PostInfo, RedditApiError, VoteRecord};

#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub token_url: String,
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub rate_limit: RateLimitConfig,
    /// Pause after the token endpoint answers 429.
    pub token_retry_delay: Duration,
    pub max_token_attempts: u32,
}

impl RedditClientConfig {
    pub fn new(user_agent: String) -> Self {
        Self {
            token_url: api::REDDIT_TOKEN_URL.to_string(),
            api_base: api::REDDIT_API_BASE.to_string(),
            user_agent,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::reddit(),
            rate_limit: RateLimitConfig::reddit_oauth(),
            token_retry_delay: Duration::from_millis(500),
            max_token_attempts: 10,
        }
    }

    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Looks up posts by fullname, keeping the token and rate window for the
/// lifetime of the process.
#[derive(Debug)]
pub struct RedditClient {
    http: Client,
    config: RedditClientConfig,
    auth: TokenManager,
    rate: RateWindow,
}

impl RedditClient {
    pub fn new(credentials: &ApiConfig, config: RedditClientConfig) -> Result<Self, CoreError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;

        let auth = TokenManager::new(
            credentials,
            config.token_url.clone(),
            config.token_retry_delay,
            config.max_token_attempts,
        );
        let rate = RateWindow::new(config.rate_limit.clone());

        Ok(Self {
            http,
            config,
            auth,
            rate,
        })
    }

    /// Makes sure a token is available. Failing here is fatal.
    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        self.auth.ensure_token(&self.http).await?;
        Ok(())
    }

    /// Looks up one batch of votes with a single `by_id` request.
    ///
    /// Failed requests are retried with a fixed delay, refreshing the token
    /// before each retry. Once the retry budget is spent the error is
    /// [`RedditApiError::RetriesExhausted`]; authentication failures are
    /// returned immediately.
    pub async fn lookup_batch(
        &mut self,
        batch: &[VoteRecord],
    ) -> Result<Vec<PostInfo>, CoreError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        if batch.len() > MAX_FULLNAMES_PER_LOOKUP {
            return Err(CoreError::InvalidInput {
                message: format!(
                    "batch of {} exceeds the {} fullname lookup limit",
                    batch.len(),
                    MAX_FULLNAMES_PER_LOOKUP
                ),
            });
        }

        if let Some(wait) = self.rate.wait_needed() {
            warn!("Rate exceeded, waiting {} seconds.", wait.as_secs());
            sleep(wait).await;
            self.rate.start_new_window();
        }

        let fullnames: Vec<&str> = batch
            .iter()
            .map(|record| record.fullname.as_str())
            .collect();
        let mut attempt = 0;

        loop {
            let token = self.auth.ensure_token(&self.http).await?;

            match api::fetch_by_id(&self.http, &self.config.api_base, &token, &fullnames).await {
                Ok(response) => {
                    self.rate.record_response(&response.rate);

                    if response.listing.data.children.is_empty() {
                        warn!("Lookup of {} fullnames returned no posts", fullnames.len());
                    }
                    let rows = api::enrich(batch, &response.listing);

                    let status = self.rate.status();
                    info!(
                        "Processed {} posts, Rate used: {}, left: {}, Seconds to reset: {}",
                        batch.len(),
                        status.used,
                        status.requests_remaining_in_window(),
                        status.reset_secs
                    );
                    return Ok(rows);
                }
                Err(e) => {
                    if e == RedditApiError::InvalidToken {
                        self.auth.invalidate();
                    }

                    match self.config.retry.decide(attempt, &e) {
                        RetryDecision::RetryAfter(delay) => {
                            warn!("An error occurred ({}), trying again in {:?}", e, delay);
                            sleep(delay).await;
                            attempt += 1;
                            debug!(
                                "Attempt {}/{} for {} fullnames",
                                attempt + 1,
                                self.config.retry.total_attempts(),
                                fullnames.len()
                            );
                        }
                        RetryDecision::GiveUp => {
                            error!("Can't resolve error, skipping: {}", e);
                            return Err(self.config.retry.final_error(attempt, e).into());
                        }
                    }
                }
            }
        }
    }

    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.rate.status()
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.auth
    }
}
