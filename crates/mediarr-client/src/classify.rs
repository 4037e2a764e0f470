//! Turning HTTP outcomes into [`ClassifiedError`]s.

use mediarr_core::ClassifiedError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::error::Error as _;
use std::time::Duration;

/// Upper bound on how much of an error body is read for its message
pub(crate) const ERROR_BODY_LIMIT: usize = 4096;

/// Classify a non-2xx response
pub(crate) fn classify_status(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    endpoint: &str,
) -> ClassifiedError {
    ClassifiedError::from_status(
        status.as_u16(),
        endpoint,
        parse_retry_after(headers),
        upstream_message(body),
    )
}

/// Classify a failure that happened before a complete response was received
pub(crate) fn classify_transport(
    error: &reqwest::Error,
    endpoint: &str,
    timeout: Duration,
) -> ClassifiedError {
    if error.is_timeout() {
        return ClassifiedError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_ms: duration_ms(timeout),
        };
    }

    if error.is_builder() {
        return ClassifiedError::Validation {
            endpoint: endpoint.to_string(),
            status: None,
            message: error_chain(error),
        };
    }

    ClassifiedError::Network {
        endpoint: endpoint.to_string(),
        message: error_chain(error),
        transient: !error.is_decode(),
    }
}

/// A 2xx body that does not have the expected shape
pub(crate) fn malformed_body(endpoint: &str, cause: impl std::fmt::Display) -> ClassifiedError {
    ClassifiedError::Network {
        endpoint: endpoint.to_string(),
        message: format!("malformed response body: {cause}"),
        transient: false,
    }
}

/// `Retry-After` as whole seconds; only the delta-seconds form is understood
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Best-effort human-readable message from an error body.
///
/// Understands the common shapes: `{"message": ..}`, `{"error": ..}`,
/// `{"errorMessage": ..}`, `{"status_message": ..}` and the *arr validation
/// array `[{"propertyName": .., "errorMessage": ..}]`. Anything else is
/// returned as trimmed text.
pub(crate) fn upstream_message(body: &[u8]) -> String {
    const KEYS: [&str; 4] = ["message", "error", "errorMessage", "status_message"];

    let from_object = |value: &serde_json::Value| {
        KEYS.iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
    };

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        let message = match &value {
            serde_json::Value::Array(items) => items.first().and_then(from_object),
            serde_json::Value::String(s) => Some(s.clone()),
            other => from_object(other),
        };
        if let Some(message) = message {
            return message;
        }
    }

    String::from_utf8_lossy(body).trim().to_string()
}

/// Display an error followed by its sources
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediarr_core::ErrorKind;
    use reqwest::header::HeaderValue;

    fn headers(retry_after: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = retry_after {
            map.insert(RETRY_AFTER, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(parse_retry_after(&headers(Some("5"))), Some(5));
        assert_eq!(parse_retry_after(&headers(Some(" 12 "))), Some(12));
        assert_eq!(
            parse_retry_after(&headers(Some("Wed, 21 Oct 2015 07:28:00 GMT"))),
            None
        );
        assert_eq!(parse_retry_after(&headers(None)), None);
    }

    #[test]
    fn test_classify_429_uses_header() {
        let err = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(Some("5")),
            b"",
            "/queue",
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));

        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, &headers(None), b"", "/queue");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_classify_carries_upstream_message() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            &headers(None),
            br#"[{"propertyName":"Path","errorMessage":"Path is already configured"}]"#,
            "/series",
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), Some(400));
        assert!(err.to_string().contains("Path is already configured"));
    }

    #[test]
    fn test_upstream_message_shapes() {
        assert_eq!(upstream_message(br#"{"message":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(upstream_message(br#"{"error":"bad token"}"#), "bad token");
        assert_eq!(
            upstream_message(br#"{"status_code":7,"status_message":"Invalid API key"}"#),
            "Invalid API key"
        );
        assert_eq!(upstream_message(b"  Forbidden\n"), "Forbidden");
        assert_eq!(upstream_message(b""), "");
        assert_eq!(upstream_message(br#"{"other":1}"#), r#"{"other":1}"#);
    }

    #[test]
    fn test_malformed_body_is_not_transient() {
        let err = malformed_body("/system/status", "expected value");
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(!err.is_retryable());
    }
}
