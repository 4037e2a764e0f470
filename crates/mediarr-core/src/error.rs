use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClassifiedError>;

/// Fallback wait used when a 429 carries no usable `Retry-After` header
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// A failed call, normalized into one of a fixed set of kinds.
///
/// Every non-success outcome of the request pipeline becomes exactly one of
/// these. The variant alone decides whether the call may be retried, see
/// [`ClassifiedError::is_retryable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    /// Transport failure before a response arrived, or a malformed response body
    #[error("network error calling {endpoint}: {message}")]
    Network {
        /// Endpoint that was being called
        endpoint: String,
        /// Underlying cause
        message: String,
        /// Whether the failure may clear up on its own (connection reset,
        /// DNS hiccup) as opposed to a body that will never parse
        transient: bool,
    },

    /// No response within the configured deadline
    #[error("request to {endpoint} timed out after {timeout_ms} ms")]
    Timeout {
        /// Endpoint that was being called
        endpoint: String,
        /// The configured timeout that elapsed
        timeout_ms: u64,
    },

    /// HTTP 429
    #[error("rate limited by {endpoint}, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Endpoint that was being called
        endpoint: String,
        /// Seconds to wait before the next attempt
        retry_after_secs: u64,
    },

    /// HTTP 401
    #[error("authentication failed for {endpoint}: {message}")]
    Unauthorized {
        /// Endpoint that was being called
        endpoint: String,
        /// Message from the upstream body, if any
        message: String,
    },

    /// HTTP 404
    #[error("resource not found: {endpoint}")]
    NotFound {
        /// The requested endpoint
        endpoint: String,
        /// Message from the upstream body, if any
        message: String,
    },

    /// Any other 4xx, or a request that could not be built
    #[error("request to {endpoint} rejected: {message}")]
    Validation {
        /// Endpoint that was being called
        endpoint: String,
        /// HTTP status, absent when the request was rejected before sending
        status: Option<u16>,
        /// Message from the upstream body or the local cause
        message: String,
    },

    /// HTTP 5xx
    #[error("server error ({status}) from {endpoint}: {message}")]
    ServerError {
        /// Endpoint that was being called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Message from the upstream body, if any
        message: String,
    },

    /// Any other non-2xx status
    #[error("unexpected status {status} from {endpoint}: {message}")]
    Unknown {
        /// Endpoint that was being called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Message from the upstream body, if any
        message: String,
    },
}

/// Fieldless discriminant of [`ClassifiedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ClassifiedError::Network`]
    Network,
    /// See [`ClassifiedError::Timeout`]
    Timeout,
    /// See [`ClassifiedError::RateLimited`]
    RateLimited,
    /// See [`ClassifiedError::Unauthorized`]
    Unauthorized,
    /// See [`ClassifiedError::NotFound`]
    NotFound,
    /// See [`ClassifiedError::Validation`]
    Validation,
    /// See [`ClassifiedError::ServerError`]
    ServerError,
    /// See [`ClassifiedError::Unknown`]
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl ClassifiedError {
    /// Map a non-2xx HTTP status to its error kind.
    ///
    /// Precedence: 429, 401, 404, other 4xx, 5xx, anything else.
    /// `retry_after_secs` is only consulted for 429; `None` falls back to
    /// [`DEFAULT_RETRY_AFTER_SECS`].
    #[must_use]
    pub fn from_status(
        status: u16,
        endpoint: impl Into<String>,
        retry_after_secs: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        let message = message.into();

        match status {
            429 => Self::RateLimited {
                endpoint,
                retry_after_secs: retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            401 => Self::Unauthorized { endpoint, message },
            404 => Self::NotFound { endpoint, message },
            400..=499 => Self::Validation {
                endpoint,
                status: Some(status),
                message,
            },
            500..=599 => Self::ServerError {
                endpoint,
                status,
                message,
            },
            _ => Self::Unknown {
                endpoint,
                status,
                message,
            },
        }
    }

    /// Returns the kind of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Returns true if another attempt may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::Unknown { .. } => true,
            Self::Network { transient, .. } => *transient,
            Self::Timeout { .. }
            | Self::Unauthorized { .. }
            | Self::NotFound { .. }
            | Self::Validation { .. } => false,
        }
    }

    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns the HTTP status code if a response was received
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::NotFound { .. } => Some(404),
            Self::Validation { status, .. } => *status,
            Self::ServerError { status, .. } | Self::Unknown { status, .. } => Some(*status),
            Self::Network { .. } | Self::Timeout { .. } => None,
        }
    }

    /// Returns the endpoint the failed call targeted
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Network { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::RateLimited { endpoint, .. }
            | Self::Unauthorized { endpoint, .. }
            | Self::NotFound { endpoint, .. }
            | Self::Validation { endpoint, .. }
            | Self::ServerError { endpoint, .. }
            | Self::Unknown { endpoint, .. } => endpoint,
        }
    }

    /// Wait requested by the upstream for a 429.
    ///
    /// This is the `Retry-After` value as sent, with no upper bound. Set
    /// `RetryConfig::max_retry_after` on the client to give up instead of
    /// honoring very long waits.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}

/// Errors raised while building a client, before any request is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting (base URL, credential) was not supplied
    #[error("missing required setting: {0}")]
    Missing(String),

    /// A setting was supplied but could not be used
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Name of the setting
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// The HTTP client could not be initialized
    #[error("failed to initialize HTTP client: {0}")]
    Http(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`]
    #[must_use]
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}
