use oauth2::basic::BasicTokenResponse;
use oauth2::{
    AccessToken, ClientId, ClientSecret, ResourceOwnerPassword, ResourceOwnerUsername,
    TokenResponse,
};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use votelens_core::{ApiConfig, RedditApiError};

/// Subtracted from the server-reported lifetime so a token is never used
/// right at its expiry.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: AccessToken,
    /// `None` when the lifetime is unknown, e.g. a token carried over from
    /// the config file.
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Holds the bearer token and performs the OAuth2 password grant when it
/// is missing or expired.
#[derive(Debug)]
pub struct TokenManager {
    token_url: String,
    client_id: ClientId,
    client_secret: ClientSecret,
    username: ResourceOwnerUsername,
    password: ResourceOwnerPassword,
    token: Option<CachedToken>,
    retry_delay: Duration,
    max_attempts: u32,
    grants: u32,
}

impl TokenManager {
    pub fn new(
        credentials: &ApiConfig,
        token_url: String,
        retry_delay: Duration,
        max_attempts: u32,
    ) -> Self {
        let token = credentials.cached_token().map(|token| CachedToken {
            access_token: AccessToken::new(token.to_string()),
            expires_at: None,
        });

        Self {
            token_url,
            client_id: ClientId::new(credentials.client_id.clone()),
            client_secret: ClientSecret::new(credentials.client_secret.clone()),
            username: ResourceOwnerUsername::new(credentials.username.clone()),
            password: ResourceOwnerPassword::new(credentials.password.clone()),
            token,
            retry_delay,
            max_attempts: max_attempts.max(1),
            grants: 0,
        }
    }

    pub fn has_valid_token(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|token| token.is_valid(Instant::now()))
    }

    /// Number of password grants performed so far.
    pub fn grant_count(&self) -> u32 {
        self.grants
    }

    /// Forget the current token so the next call performs a new grant.
    pub fn invalidate(&mut self) {
        if self.token.take().is_some() {
            debug!("Discarded rejected access token");
        }
    }

    /// Returns a usable token, requesting a new one when needed.
    pub async fn ensure_token(&mut self, http: &Client) -> Result<AccessToken, RedditApiError> {
        if let Some(token) = &self.token {
            if token.is_valid(Instant::now()) {
                return Ok(token.access_token.clone());
            }
            debug!("Access token expired, requesting a new one");
        }

        let response = self.request_token(http).await?;
        let lifetime = response.expires_in();
        let expires_at = lifetime.and_then(|lifetime| expiry_deadline(Instant::now(), lifetime));

        info!(
            "Obtained Reddit access token (expires in {:?})",
            lifetime.unwrap_or_default()
        );

        let access_token = response.access_token().clone();
        self.token = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        self.grants += 1;

        Ok(access_token)
    }

    async fn request_token(&self, http: &Client) -> Result<BasicTokenResponse, RedditApiError> {
        for attempt in 1..=self.max_attempts {
            let response = http
                .post(&self.token_url)
                .basic_auth(self.client_id.as_str(), Some(self.client_secret.secret()))
                .form(&[
                    ("grant_type", "password"),
                    ("username", self.username.as_str()),
                    ("password", self.password.secret().as_str()),
                ])
                .send()
                .await
                .map_err(|e| RedditApiError::AuthenticationFailed {
                    reason: format!("token request failed: {e}"),
                })?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await.map_err(|e| {
                        RedditApiError::AuthenticationFailed {
                            reason: format!("could not read token response: {e}"),
                        }
                    })?;
                    return parse_token_response(&body);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!(
                        "Token endpoint rate limited (attempt {}/{}), retrying in {:?}",
                        attempt, self.max_attempts, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                }
                status => {
                    return Err(RedditApiError::AuthenticationFailed {
                        reason: format!("token endpoint returned {status}"),
                    });
                }
            }
        }

        Err(RedditApiError::AuthenticationFailed {
            reason: format!(
                "token endpoint still rate limited after {} attempts",
                self.max_attempts
            ),
        })
    }
}

/// `None` when the lifetime does not fit in an `Instant`; such a token is
/// treated like one of unknown lifetime.
fn expiry_deadline(now: Instant, lifetime: Duration) -> Option<Instant> {
    now.checked_add(lifetime.saturating_sub(EXPIRY_MARGIN))
}

/// Reddit answers a rejected grant with 200 and an `error` field.
fn parse_token_response(body: &str) -> Result<BasicTokenResponse, RedditApiError> {
    serde_json::from_str::<BasicTokenResponse>(body).map_err(|parse_error| {
        let reason = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("error").map(|error| error.to_string()))
            .unwrap_or_else(|| format!("unparsable token response: {parse_error}"));
        RedditApiError::AuthenticationFailed { reason }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(cached: Option<&str>) -> ApiConfig {
        ApiConfig {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            access_token: cached.map(str::to_string),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: None,
        }
    }

    #[test]
    fn test_parse_token_response() {
        let body = r#"{"access_token":"abc","token_type":"bearer","expires_in":86400,"scope":"*"}"#;
        let response = parse_token_response(body).unwrap();
        assert_eq!(response.access_token().secret(), "abc");
        assert_eq!(response.expires_in(), Some(Duration::from_secs(86400)));
    }

    #[test]
    fn test_parse_rejected_grant() {
        let err = parse_token_response(r#"{"error": "invalid_grant"}"#).unwrap_err();
        match err {
            RedditApiError::AuthenticationFailed { reason } => {
                assert!(reason.contains("invalid_grant"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cached_token_seeds_manager() {
        let manager = TokenManager::new(
            &credentials(Some("cached")),
            "http://localhost/token".to_string(),
            Duration::from_millis(1),
            3,
        );
        assert!(manager.has_valid_token());
        assert_eq!(manager.grant_count(), 0);
    }

    #[test]
    fn test_invalidate_drops_token() {
        let mut manager = TokenManager::new(
            &credentials(Some("cached")),
            "http://localhost/token".to_string(),
            Duration::from_millis(1),
            3,
        );
        manager.invalidate();
        assert!(!manager.has_valid_token());
    }

    #[test]
    fn test_expiry_deadline_applies_margin() {
        let now = Instant::now();
        assert_eq!(
            expiry_deadline(now, Duration::from_secs(3600)),
            Some(now + Duration::from_secs(3540))
        );
        assert_eq!(expiry_deadline(now, Duration::from_secs(30)), Some(now));
    }

    #[test]
    fn test_huge_lifetime_does_not_overflow() {
        assert_eq!(expiry_deadline(Instant::now(), Duration::MAX), None);

        let body = format!(
            r#"{{"access_token":"abc","token_type":"bearer","expires_in":{}}}"#,
            u64::MAX
        );
        let response = parse_token_response(&body).unwrap();
        let lifetime = response.expires_in().unwrap();
        assert!(expiry_deadline(Instant::now(), lifetime).is_none());
    }

    #[test]
    fn test_token_expiry() {
        let now = Instant::now();
        let live = CachedToken {
            access_token: AccessToken::new("a".to_string()),
            expires_at: Some(now + Duration::from_secs(30)),
        };
        let dead = CachedToken {
            access_token: AccessToken::new("b".to_string()),
            expires_at: Some(now),
        };
        let unknown = CachedToken {
            access_token: AccessToken::new("c".to_string()),
            expires_at: None,
        };

        assert!(live.is_valid(now));
        assert!(!dead.is_valid(now));
        assert!(unknown.is_valid(now));
    }
}
