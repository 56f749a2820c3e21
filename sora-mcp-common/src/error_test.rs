//! Property-based tests for error module.
//!
//! These tests validate that error messages keep the context a caller needs
//! to diagnose an upstream failure.

use proptest::prelude::*;

use crate::error::Error;

/// Generate valid HTTP status codes (100-599)
fn http_status_strategy() -> impl Strategy<Value = u16> {
    100u16..600u16
}

/// Generate Sora API endpoint URLs
fn endpoint_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("https://api\\.openai\\.com/v1/videos(/video_[a-z0-9]{8})?")
        .unwrap()
        .prop_filter("endpoint must be non-empty", |s| !s.is_empty())
}

/// Generate upstream response bodies, including JSON punctuation
fn body_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 {}:,\"_.-]{1,120}"
}

/// Generate step descriptions
fn context_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z ]{3,40}"
}

proptest! {
    /// *For any* API error, the message includes the endpoint, the HTTP
    /// status code and the response body exactly as received.
    #[test]
    fn api_error_includes_endpoint_status_and_body(
        endpoint in endpoint_strategy(),
        status_code in http_status_strategy(),
        body in body_strategy()
    ) {
        let err = Error::api(&endpoint, status_code, &body);
        let err_string = err.to_string();

        prop_assert!(
            err_string.contains(&endpoint),
            "API error should include endpoint '{}' in message: {}",
            endpoint,
            err_string
        );
        prop_assert!(
            err_string.contains(&status_code.to_string()),
            "API error should include status code '{}' in message: {}",
            status_code,
            err_string
        );
        prop_assert!(
            err_string.contains(&body),
            "API error should include the raw body '{}' in message: {}",
            body,
            err_string
        );
    }

    /// *For any* labelled error, the label comes first and the original
    /// message is preserved after it.
    #[test]
    fn context_preserves_inner_message(
        context in context_strategy(),
        status_code in http_status_strategy(),
        body in body_strategy()
    ) {
        let inner = Error::api("https://api.openai.com/v1/videos", status_code, &body);
        let inner_string = inner.to_string();
        let err = inner.context(&context);
        let err_string = err.to_string();

        prop_assert!(err_string.starts_with(&context));
        prop_assert!(err_string.ends_with(&inner_string));
        prop_assert_eq!(err.status_code(), Some(status_code));
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn invalid_value_includes_name_and_reason() {
        let err = ConfigError::invalid_value("PORT", "not a number");
        let msg = err.to_string();
        assert!(msg.contains("PORT"));
        assert!(msg.contains("not a number"));
    }

    #[test]
    fn io_error_is_transparent() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.to_string(), "denied");
    }
}
