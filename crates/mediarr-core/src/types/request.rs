use serde::Serialize;

/// HTTP method of a [`RequestSpec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns true if repeating the request has the same effect as sending it once.
    ///
    /// POST and PATCH are treated as unsafe to repeat; none of the upstream
    /// services accept an idempotency key.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        !matches!(self, Self::Post | Self::Patch)
    }

    /// Upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body attached to a [`RequestSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-serialized JSON
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
}

/// Description of one logical call.
///
/// Built fresh for every call and consumed by the client.
///
/// # Example
///
/// ```rust
/// use mediarr_core::{HttpMethod, RequestSpec};
///
/// let spec = RequestSpec::get("/calendar")
///     .query("start", "2024-01-01")
///     .query("end", "2024-01-31");
///
/// assert_eq!(spec.method(), HttpMethod::Get);
/// assert_eq!(spec.path(), "/calendar");
/// assert!(spec.is_idempotent());
/// ```
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    body_error: Option<String>,
    idempotent: Option<bool>,
}

impl RequestSpec {
    /// Create a request with the given method and path
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            body_error: None,
            idempotent: None,
        }
    }

    /// GET request
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// POST request
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// PUT request
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// PATCH request
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// DELETE request
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append several query parameters
    #[must_use]
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Add a request header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// The value is serialized immediately. If that fails, the call is
    /// rejected with a validation error before anything is sent.
    #[must_use]
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.body = Some(RequestBody::Json(bytes));
                self.body_error = None;
            }
            Err(e) => {
                self.body = None;
                self.body_error = Some(e.to_string());
            }
        }
        self
    }

    /// Attach form fields
    #[must_use]
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        self.body = Some(RequestBody::Form(fields));
        self.body_error = None;
        self
    }

    /// Override whether the call may be retried.
    ///
    /// By default only idempotent methods are retried.
    #[must_use]
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = Some(idempotent);
        self
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path relative to the client's base URL
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order
    #[must_use]
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// Extra headers in insertion order
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Request body, if any
    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Why the body could not be serialized, if it could not
    #[must_use]
    pub fn body_error(&self) -> Option<&str> {
        self.body_error.as_deref()
    }

    /// Whether a retryable failure may lead to another attempt
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.idempotent.unwrap_or_else(|| self.method.is_idempotent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use std::collections::HashMap;

    #[test]
    fn test_method_idempotency() {
        assert!(HttpMethod::Get.is_idempotent());
        assert!(HttpMethod::Head.is_idempotent());
        assert!(HttpMethod::Put.is_idempotent());
        assert!(HttpMethod::Delete.is_idempotent());
        assert!(!HttpMethod::Post.is_idempotent());
        assert!(!HttpMethod::Patch.is_idempotent());
    }

    #[test]
    fn test_idempotent_override() {
        assert!(!RequestSpec::post("/command").is_idempotent());
        assert!(RequestSpec::post("/command").idempotent(true).is_idempotent());
        assert!(!RequestSpec::get("/queue").idempotent(false).is_idempotent());
    }

    #[test]
    fn test_json_body() {
        let mut body = HashMap::new();
        body.insert("name", "RefreshSeries");
        let spec = RequestSpec::post("/command").json(&body);

        match spec.body() {
            Some(RequestBody::Json(bytes)) => {
                let value: serde_json::Value = serde_json::from_slice(bytes).unwrap();
                assert_eq!(value["name"], "RefreshSeries");
            }
            other => panic!("unexpected body: {other:?}"),
        }
        assert!(spec.body_error().is_none());
    }

    #[test]
    fn test_json_body_error_is_kept() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("cannot serialize"))
            }
        }

        let spec = RequestSpec::post("/command").json(&Broken);
        assert!(spec.body().is_none());
        assert_eq!(spec.body_error(), Some("cannot serialize"));
    }

    #[test]
    fn test_query_order() {
        let spec = RequestSpec::get("/api")
            .query("mode", "queue")
            .queries([("start", 0), ("limit", 20)]);

        let keys: Vec<_> = spec.query_params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["mode", "start", "limit"]);
        assert_eq!(spec.query_params()[2].1, "20");
    }
}
