use votelens_core::{
    ConfigError, CoreError, ErrorExt, ErrorReporter, InputError, RedditApiError,
};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "client_id".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let input_error = CoreError::Input(InputError::MalformedRecord {
        position: 12,
        details: "short row".to_string(),
    });
    assert_eq!(input_error.error_code(), "INPUT");
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let expired = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert!(expired.is_retryable());

    let non_retryable_error = CoreError::Config(ConfigError::MissingField {
        field: "client_id".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());

    let bad_body = RedditApiError::InvalidResponse {
        details: "truncated".to_string(),
    };
    assert!(!bad_body.is_retryable());
}

#[test]
fn test_fatal_errors() {
    let auth = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "invalid_grant".to_string(),
    });
    assert!(auth.is_fatal());

    let exhausted = CoreError::RedditApi(RedditApiError::RetriesExhausted {
        attempts: 6,
        last_error: "Server error: 503".to_string(),
    });
    assert!(!exhausted.is_fatal());

    let open = CoreError::Input(InputError::InputOpen {
        path: "votes.csv".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    });
    assert!(open.is_fatal());

    let malformed = CoreError::Input(InputError::MalformedRecord {
        position: 0,
        details: "short row".to_string(),
    });
    assert!(!malformed.is_fatal());
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "401".to_string(),
    });
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("auth.yaml"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "client_id".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("client_id"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new();
    let error = CoreError::RedditApi(RedditApiError::InvalidToken);

    // Only checks that reporting does not panic
    reporter.report_error(&error);
}
