use crate::rate_limiter::RateLimitHeaders;
use oauth2::AccessToken;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, warn};
use votelens_core::{PostInfo, RedditApiError, VoteRecord};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Reddit refuses `by_id` lookups of more than 100 fullnames.
pub const MAX_FULLNAMES_PER_LOOKUP: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub modhash: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    /// The post fullname, e.g. `t3_abc123`.
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub subreddit: String,
}

/// A successful `by_id` answer together with its rate limit headers.
#[derive(Debug)]
pub struct LookupResponse {
    pub listing: RedditListing<RedditPostData>,
    pub rate: RateLimitHeaders,
}

pub fn by_id_endpoint(fullnames: &[&str]) -> String {
    format!("/by_id/{}", fullnames.join(","))
}

/// Issues one `GET /by_id/<fullnames>` request.
pub async fn fetch_by_id(
    http: &Client,
    api_base: &str,
    access_token: &AccessToken,
    fullnames: &[&str],
) -> Result<LookupResponse, RedditApiError> {
    let endpoint = by_id_endpoint(fullnames);
    let url = format!("{}{}", api_base.trim_end_matches('/'), endpoint);

    debug!("Making Reddit API request: GET {}", endpoint);
    let response = http
        .get(&url)
        .bearer_auth(access_token.secret())
        .send()
        .await
        .map_err(|e| {
            error!("Network error for GET {}: {}", endpoint, e);
            if e.is_timeout() {
                RedditApiError::RequestTimeout
            } else {
                RedditApiError::Transport {
                    details: e.to_string(),
                }
            }
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        error!("Request failed with status: {} for {}", status, endpoint);
        return Err(classify_status(status, response.headers(), &endpoint));
    }

    let rate = RateLimitHeaders::from_headers(response.headers());
    let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
        error!("Failed to parse by_id listing: {}", e);
        RedditApiError::InvalidResponse {
            details: format!("Failed to parse listing for {} fullnames", fullnames.len()),
        }
    })?;

    Ok(LookupResponse { listing, rate })
}

fn classify_status(status: StatusCode, headers: &HeaderMap, endpoint: &str) -> RedditApiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        StatusCode::UNAUTHORIZED => RedditApiError::InvalidToken,
        StatusCode::FORBIDDEN => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        status if status.is_server_error() => RedditApiError::ServerError {
            status_code: status.as_u16(),
        },
        status => RedditApiError::UnexpectedStatus {
            status_code: status.as_u16(),
        },
    }
}

/// Pairs every vote with the listing child carrying the same fullname.
///
/// Output follows input order. Votes whose post is absent from the listing
/// produce no row.
pub fn enrich(batch: &[VoteRecord], listing: &RedditListing<RedditPostData>) -> Vec<PostInfo> {
    let posts: HashMap<&str, &RedditPostData> = listing
        .data
        .children
        .iter()
        .map(|child| (child.data.name.as_str(), &child.data))
        .collect();

    batch
        .iter()
        .filter_map(|record| match posts.get(record.fullname.as_str()) {
            Some(post) => Some(PostInfo::from_vote(
                record,
                post.subreddit.as_str(),
                post.title.as_str(),
                post.selftext.as_str(),
            )),
            None => {
                debug!("No post returned for {}", record.fullname);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(children: serde_json::Value) -> RedditListing<RedditPostData> {
        serde_json::from_value(json!({
            "kind": "Listing",
            "data": {
                "children": children,
                "after": null,
                "before": null,
                "modhash": null,
                "dist": 2
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_by_id_endpoint() {
        assert_eq!(by_id_endpoint(&["t3_a", "t3_b"]), "/by_id/t3_a,t3_b");
        assert_eq!(by_id_endpoint(&["t3_a"]), "/by_id/t3_a");
    }

    #[test]
    fn test_enrich_matches_by_fullname() {
        let listing = listing(json!([
            {"kind": "t3", "data": {"name": "t3_b", "title": "B", "subreddit": "rust", "selftext": "body b"}},
            {"kind": "t3", "data": {"name": "t3_a", "title": "A", "subreddit": "golang", "selftext": ""}}
        ]));
        let batch = vec![
            VoteRecord::new("alice", "t3_a", "1"),
            VoteRecord::new("bob", "t3_b", "-1"),
        ];

        let rows = enrich(&batch, &listing);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].subreddit, "golang");
        assert_eq!(rows[0].title, "A");
        assert_eq!(rows[1].username, "bob");
        assert_eq!(rows[1].vote, "-1");
        assert_eq!(rows[1].content, "body b");
    }

    #[test]
    fn test_enrich_skips_missing_posts() {
        let listing = listing(json!([
            {"kind": "t3", "data": {"name": "t3_a", "title": "A", "subreddit": "rust", "selftext": ""}}
        ]));
        let batch = vec![
            VoteRecord::new("alice", "t3_a", "1"),
            VoteRecord::new("bob", "t3_gone", "1"),
        ];

        let rows = enrich(&batch, &listing);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "alice");
    }

    #[test]
    fn test_enrich_duplicate_fullnames() {
        let listing = listing(json!([
            {"kind": "t3", "data": {"name": "t3_a", "title": "A", "subreddit": "rust", "selftext": ""}}
        ]));
        let batch = vec![
            VoteRecord::new("alice", "t3_a", "1"),
            VoteRecord::new("bob", "t3_a", "-1"),
        ];

        let rows = enrich(&batch, &listing);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].username, "bob");
    }

    #[test]
    fn test_classify_status() {
        let headers = HeaderMap::new();
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, &headers, "/by_id/t3_a"),
            RedditApiError::InvalidToken
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, &headers, "/by_id/t3_a"),
            RedditApiError::RateLimitExceeded { retry_after: 60 }
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY, &headers, "/by_id/t3_a"),
            RedditApiError::ServerError { status_code: 502 }
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, &headers, "/by_id/t3_a"),
            RedditApiError::UnexpectedStatus { status_code: 404 }
        );
    }
}
