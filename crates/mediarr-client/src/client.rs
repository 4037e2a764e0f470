//! The resilient request client.

use crate::classify::{self, duration_ms, ERROR_BODY_LIMIT};
use crate::config::ClientConfig;
use crate::rate_limit::RateLimiter;
use crate::retry;
use mediarr_core::{
    ClassifiedError, ConfigError, Credential, HttpMethod, RequestBody, RequestSpec, Result,
    Service,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Rate-limited, retrying client for one backend.
///
/// Cheap to clone; clones share the rate limiter, so the spacing between
/// request starts holds across all of them.
///
/// # Example
///
/// ```rust,ignore
/// use mediarr_client::{ClientConfig, MediaClient};
/// use mediarr_core::{RequestSpec, Service};
///
/// let client = MediaClient::new(ClientConfig::from_env(Service::Sonarr)?)?;
/// let status: serde_json::Value = client.get("/system/status").await?;
/// ```
#[derive(Clone)]
pub struct MediaClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    config: ClientConfig,
    base_url: String,
    auth: Auth,
    limiter: RateLimiter,
}

/// Credential resolved into what gets attached to each request
enum Auth {
    Header(HeaderName, HeaderValue),
    Query(String, String),
}

impl MediaClient {
    /// Validate `config` and build a client for it
    pub fn new(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let auth = Auth::from_credential(&config.credential)?;
        let base_url = join_base(&config.base_url, &config.api_prefix);

        let interval = config.min_interval()?;
        let limiter = match config.burst {
            Some(cells) => RateLimiter::with_burst(interval, cells),
            None => RateLimiter::new(interval),
        };

        let http = HttpClient::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;

        debug!(
            base_url = %base_url,
            scheme = config.credential.scheme(),
            "client configured"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                base_url,
                auth,
                limiter,
            }),
        })
    }

    /// Build a client for `service` from the process environment
    pub fn from_env(service: Service) -> std::result::Result<Self, ConfigError> {
        Self::new(ClientConfig::from_env(service)?)
    }

    /// The configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Execute a call and decode the JSON response body.
    ///
    /// An empty 2xx body decodes as JSON `null`.
    pub async fn execute<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T> {
        let body = self.send(&spec).await?;
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body
        };
        serde_json::from_slice(body).map_err(|e| classify::malformed_body(spec.path(), e))
    }

    /// Execute a call and return the response body as text
    pub async fn execute_text(&self, spec: RequestSpec) -> Result<String> {
        let body = self.send(&spec).await?;
        String::from_utf8(body).map_err(|e| classify::malformed_body(spec.path(), e))
    }

    /// Execute a call, discarding the response body
    pub async fn execute_unit(&self, spec: RequestSpec) -> Result<()> {
        self.send(&spec).await.map(drop)
    }

    /// Perform a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(RequestSpec::get(path)).await
    }

    /// Perform a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        self.execute(RequestSpec::get(path).queries(params.iter().copied())).await
    }

    /// Perform a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(RequestSpec::post(path).json(body)).await
    }

    /// Perform a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(RequestSpec::put(path).json(body)).await
    }

    /// Perform a DELETE request
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute_unit(RequestSpec::delete(path)).await
    }

    /// Run the full pipeline for one logical call and return the raw 2xx body
    #[instrument(skip(self, spec), fields(method = %spec.method(), endpoint = %spec.path()))]
    async fn send(&self, spec: &RequestSpec) -> Result<Vec<u8>> {
        if let Some(cause) = spec.body_error() {
            return Err(ClassifiedError::Validation {
                endpoint: spec.path().to_string(),
                status: None,
                message: format!("request body could not be serialized: {cause}"),
            });
        }

        let headers = self.headers_for(spec)?;

        retry::run(
            &self.inner.config.retry,
            spec.is_idempotent(),
            spec.path(),
            |attempt| self.attempt(spec, headers.clone(), attempt),
        )
        .await
    }

    /// One outbound request: wait for the limiter, send under the deadline,
    /// classify the outcome
    async fn attempt(
        &self,
        spec: &RequestSpec,
        headers: HeaderMap,
        attempt: u32,
    ) -> Result<Vec<u8>> {
        let endpoint = spec.path();
        let request = self.build_request(spec, headers);

        self.inner.limiter.acquire().await;
        debug!(endpoint, attempt, "dispatching request");

        let timeout = self.inner.config.timeout;
        match tokio::time::timeout(timeout, self.dispatch(request, endpoint)).await {
            Ok(outcome) => outcome,
            // the in-flight request future is dropped here, closing its connection
            Err(_) => Err(ClassifiedError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: duration_ms(timeout),
            }),
        }
    }

    async fn dispatch(&self, request: reqwest::RequestBuilder, endpoint: &str) -> Result<Vec<u8>> {
        let timeout = self.inner.config.timeout;
        let response = request
            .send()
            .await
            .map_err(|e| classify::classify_transport(&e, endpoint, timeout))?;

        let status = response.status();
        if status.is_success() {
            return response
                .bytes()
                .await
                .map(|body| body.to_vec())
                .map_err(|e| classify::classify_transport(&e, endpoint, timeout));
        }

        let headers = response.headers().clone();
        let body = read_limited(response, ERROR_BODY_LIMIT).await;
        Err(classify::classify_status(status, &headers, &body, endpoint))
    }

    fn build_request(&self, spec: &RequestSpec, headers: HeaderMap) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, normalize_path(spec.path()));

        let mut query: Vec<(&str, &str)> = spec
            .query_params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Auth::Query(param, value) = &self.inner.auth {
            query.retain(|(k, _)| *k != param.as_str());
            query.push((param.as_str(), value.as_str()));
        }

        let mut request = self
            .inner
            .http
            .request(to_method(spec.method()), url)
            .headers(headers);
        if !query.is_empty() {
            request = request.query(&query);
        }

        match spec.body() {
            Some(RequestBody::Json(bytes)) => request
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            Some(RequestBody::Form(fields)) => request.form(fields),
            None => request,
        }
    }

    /// Per-call headers with the credential header applied last
    fn headers_for(&self, spec: &RequestSpec) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        for (name, value) in spec.headers() {
            let invalid = |what: &str| ClassifiedError::Validation {
                endpoint: spec.path().to_string(),
                status: None,
                message: format!("invalid header {what}: {name}"),
            };
            let name = HeaderName::try_from(name.as_str()).map_err(|_| invalid("name"))?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid("value"))?;
            headers.append(name, value);
        }

        if let Auth::Header(name, value) = &self.inner.auth {
            headers.insert(name.clone(), value.clone());
        }

        Ok(headers)
    }
}

impl std::fmt::Debug for MediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaClient")
            .field("base_url", &self.inner.base_url)
            .field("credential", &self.inner.config.credential)
            .finish_non_exhaustive()
    }
}

impl Auth {
    fn from_credential(credential: &Credential) -> std::result::Result<Self, ConfigError> {
        type AuthResult = std::result::Result<Auth, ConfigError>;

        let header = |name: HeaderName, value: String| -> AuthResult {
            let mut value = HeaderValue::try_from(value)
                .map_err(|_| ConfigError::invalid("credential", "not a valid header value"))?;
            value.set_sensitive(true);
            Ok(Auth::Header(name, value))
        };

        match credential {
            Credential::Header { name, value } => {
                let name = HeaderName::try_from(name.as_str())
                    .map_err(|_| ConfigError::invalid("credential", "not a valid header name"))?;
                header(name, value.clone())
            }
            Credential::Bearer(token) => header(AUTHORIZATION, format!("Bearer {token}")),
            Credential::Cookie { name, value } => header(COOKIE, format!("{name}={value}")),
            Credential::Query { param, value } => Ok(Self::Query(param.clone(), value.clone())),
        }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn join_base(base_url: &str, prefix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{prefix}")
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Read at most `limit` bytes of an error body; read failures yield what
/// was read so far
async fn read_limited(mut response: reqwest::Response, limit: usize) -> Vec<u8> {
    let mut body = Vec::new();
    while body.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    body
}
