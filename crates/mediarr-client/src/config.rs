//! Client configuration types.

use mediarr_core::{ConfigError, Credential, Service};
use std::num::NonZeroU32;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default sustained request rate
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 2.0;

/// Longest accepted spacing between request starts
pub const MAX_REQUEST_INTERVAL: Duration = Duration::from_secs(86_400);

/// Retry configuration for failed requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries; total attempts is one more than this
    pub max_retries: u32,

    /// Base of the exponential backoff
    pub initial_backoff: Duration,

    /// Upper bound of a single backoff wait
    pub max_backoff: Duration,

    /// Longest `Retry-After` wait to honor; a 429 asking for more is
    /// returned to the caller. `None` honors any wait.
    pub max_retry_after: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(5000),
            max_retry_after: None,
        }
    }

    /// Set maximum retries
    #[must_use]
    pub const fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set initial backoff duration
    #[must_use]
    pub const fn initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Set maximum backoff duration
    #[must_use]
    pub const fn max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Give up on 429s that ask to wait longer than `limit`
    #[must_use]
    pub const fn max_retry_after(mut self, limit: Duration) -> Self {
        self.max_retry_after = Some(limit);
        self
    }

    /// Calculate backoff for a given step: `min(initial * 2^step, max)`
    #[must_use]
    pub fn backoff_for(&self, step: u32) -> Duration {
        let initial = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        let backoff = 2u64
            .checked_pow(step)
            .and_then(|factor| initial.checked_mul(factor))
            .unwrap_or(u64::MAX);
        Duration::from_millis(backoff.min(max))
    }
}

/// Everything needed to talk to one backend.
///
/// Built once per backend at startup and handed to
/// [`MediaClient::new`](crate::MediaClient::new), which validates it and
/// keeps it for the lifetime of the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:8989`
    pub base_url: String,

    /// How requests authenticate
    pub credential: Credential,

    /// Path inserted between the base URL and every request path
    pub api_prefix: String,

    /// Deadline for a single attempt, from dispatch to the full response
    pub timeout: Duration,

    /// Sustained rate of request starts
    pub requests_per_second: f64,

    /// Burst cells; `None` spaces every request evenly
    pub burst: Option<NonZeroU32>,

    /// Retry behavior
    pub retry: RetryConfig,

    /// User-Agent header
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default timeout, rate and retry settings
    #[must_use]
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            credential,
            api_prefix: String::new(),
            timeout: DEFAULT_TIMEOUT,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            burst: None,
            retry: RetryConfig::default(),
            user_agent: format!("mediarr/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create a configuration for a known service, using its API prefix and
    /// credential scheme
    #[must_use]
    pub fn for_service(
        service: Service,
        base_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self::new(base_url, service.credential(secret)).api_prefix(service.api_prefix())
    }

    /// Read a service's configuration from the process environment.
    ///
    /// See [`ClientConfig::from_env_with`] for the variables consulted.
    pub fn from_env(service: Service) -> Result<Self, ConfigError> {
        Self::from_env_with(service, |key| std::env::var(key).ok())
    }

    /// Read a service's configuration through `lookup`.
    ///
    /// Required: `<PREFIX>_URL` (unless the service has a public default) and
    /// the service's credential variable. Optional overrides:
    /// `<PREFIX>_TIMEOUT_MS`, `<PREFIX>_MAX_RETRIES`,
    /// `<PREFIX>_REQUESTS_PER_SECOND`.
    pub fn from_env_with<F>(service: Service, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url_key = service.url_env();
        let base_url = get(&url_key)
            .or_else(|| service.default_base_url().map(String::from))
            .ok_or(ConfigError::Missing(url_key))?;

        let credential_key = service.credential_env();
        let secret = get(&credential_key).ok_or(ConfigError::Missing(credential_key))?;

        let mut config = Self::for_service(service, base_url, secret);
        let prefix = service.env_prefix();

        let key = format!("{prefix}_TIMEOUT_MS");
        if let Some(raw) = get(&key) {
            config.timeout = Duration::from_millis(parse_setting(&key, &raw)?);
        }

        let key = format!("{prefix}_MAX_RETRIES");
        if let Some(raw) = get(&key) {
            config.retry.max_retries = parse_setting(&key, &raw)?;
        }

        let key = format!("{prefix}_REQUESTS_PER_SECOND");
        if let Some(raw) = get(&key) {
            config.requests_per_second = parse_setting(&key, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the API path prefix
    #[must_use]
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum retries
    #[must_use]
    pub fn max_retries(mut self, max: u32) -> Self {
        self.retry.max_retries = max;
        self
    }

    /// Set the sustained request rate
    #[must_use]
    pub fn requests_per_second(mut self, rate: f64) -> Self {
        self.requests_per_second = rate;
        self
    }

    /// Allow up to `cells` requests to start back to back after an idle
    /// period, at the same sustained rate
    #[must_use]
    pub fn burst(mut self, cells: NonZeroU32) -> Self {
        self.burst = Some(cells);
        self
    }

    /// Set retry configuration
    #[must_use]
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Minimum spacing between request starts.
    ///
    /// Fails unless `requests_per_second` is a positive number giving a
    /// spacing of at most [`MAX_REQUEST_INTERVAL`].
    pub fn min_interval(&self) -> Result<Duration, ConfigError> {
        let invalid = || {
            ConfigError::invalid(
                "requests_per_second",
                format!(
                    "{} is not a positive rate of at least one request per {}s",
                    self.requests_per_second,
                    MAX_REQUEST_INTERVAL.as_secs()
                ),
            )
        };

        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(invalid());
        }

        Duration::try_from_secs_f64(1.0 / self.requests_per_second)
            .ok()
            .filter(|interval| *interval <= MAX_REQUEST_INTERVAL)
            .ok_or_else(invalid)
    }

    /// Check the configuration without building a client
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credential.is_blank() {
            return Err(ConfigError::Missing("credential".to_string()));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::invalid("base_url", format!("{}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "base_url",
                format!("unsupported scheme {}", url.scheme()),
            ));
        }

        self.min_interval()?;

        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "must be greater than zero"));
        }

        Ok(())
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("{raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_backoff_schedule() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff_for(1), Duration::from_millis(2000));
        assert_eq!(retry.backoff_for(2), Duration::from_millis(4000));
        assert_eq!(retry.backoff_for(3), Duration::from_millis(5000));
        assert_eq!(retry.backoff_for(64), Duration::from_millis(5000));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:8989", Credential::api_key("abc"));
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.retry.max_retries, 3);
        assert!((config.requests_per_second - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.min_interval().unwrap(), Duration::from_millis(500));
        assert!(config.burst.is_none());
    }

    #[test]
    fn test_from_env_minimal() {
        let config = ClientConfig::from_env_with(
            Service::Sonarr,
            env(&[
                ("SONARR_URL", "http://sonarr:8989"),
                ("SONARR_API_KEY", "secret"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_url, "http://sonarr:8989");
        assert_eq!(config.api_prefix, "/api/v3");
        assert_eq!(config.credential, Credential::api_key("secret"));
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_from_env_overrides() {
        let config = ClientConfig::from_env_with(
            Service::Sabnzbd,
            env(&[
                ("SABNZBD_URL", "http://sab:8080"),
                ("SABNZBD_API_KEY", "secret"),
                ("SABNZBD_TIMEOUT_MS", "1500"),
                ("SABNZBD_MAX_RETRIES", "0"),
                ("SABNZBD_REQUESTS_PER_SECOND", "10"),
            ]),
        )
        .unwrap();

        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.min_interval().unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn test_from_env_missing_credential_is_fatal() {
        let err = ClientConfig::from_env_with(
            Service::Radarr,
            env(&[("RADARR_URL", "http://radarr:7878"), ("RADARR_API_KEY", "  ")]),
        )
        .unwrap_err();

        assert_eq!(err, ConfigError::Missing("RADARR_API_KEY".to_string()));
    }

    #[test]
    fn test_from_env_default_url() {
        let config =
            ClientConfig::from_env_with(Service::Tmdb, env(&[("TMDB_ACCESS_TOKEN", "tok")]))
                .unwrap();
        assert_eq!(config.base_url, "https://api.themoviedb.org");
        assert_eq!(config.api_prefix, "/3");

        let err = ClientConfig::from_env_with(Service::Gotify, env(&[("GOTIFY_TOKEN", "t")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("GOTIFY_URL".to_string()));
    }

    #[test]
    fn test_from_env_invalid_number() {
        let err = ClientConfig::from_env_with(
            Service::Sonarr,
            env(&[
                ("SONARR_URL", "http://sonarr:8989"),
                ("SONARR_API_KEY", "secret"),
                ("SONARR_MAX_RETRIES", "many"),
            ]),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "SONARR_MAX_RETRIES"));
    }

    #[test]
    fn test_validate() {
        let ok = ClientConfig::new("https://example.org", Credential::bearer("t"));
        assert!(ok.validate().is_ok());

        let bad_url = ClientConfig::new("not a url", Credential::bearer("t"));
        assert!(matches!(bad_url.validate(), Err(ConfigError::Invalid { .. })));

        let ftp = ClientConfig::new("ftp://example.org", Credential::bearer("t"));
        assert!(matches!(ftp.validate(), Err(ConfigError::Invalid { .. })));

        let zero_rate = ok.clone().requests_per_second(0.0);
        assert!(matches!(zero_rate.validate(), Err(ConfigError::Invalid { .. })));

        let zero_timeout = ok.timeout(Duration::ZERO);
        assert!(matches!(zero_timeout.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_rate_too_small_for_an_interval_is_rejected() {
        let config = ClientConfig::from_env_with(
            Service::Sonarr,
            env(&[
                ("SONARR_URL", "http://sonarr:8989"),
                ("SONARR_API_KEY", "secret"),
                ("SONARR_REQUESTS_PER_SECOND", "1e-20"),
            ]),
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref key, .. } if key == "requests_per_second")
        );
        assert!(config.min_interval().is_err());

        for rate in [f64::NAN, f64::INFINITY, -1.0, 1.0 / 100_000.0] {
            let config = ClientConfig::new("http://sonarr:8989", Credential::api_key("k"))
                .requests_per_second(rate);
            assert!(config.validate().is_err(), "rate {rate} accepted");
        }

        let hourly = ClientConfig::new("http://sonarr:8989", Credential::api_key("k"))
            .requests_per_second(1.0 / 3600.0);
        let interval = hourly.min_interval().unwrap();
        assert!(interval > Duration::from_secs(3599) && interval < Duration::from_secs(3601));
    }
}
