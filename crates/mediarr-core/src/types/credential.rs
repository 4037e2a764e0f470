/// How a client authenticates to its backend.
///
/// Chosen once when the client is built; every request through that client
/// carries it. `Debug` output never contains the secret.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// API key sent in a named header (`X-Api-Key`, `X-Gotify-Key`)
    Header {
        /// Header name
        name: String,
        /// Secret value
        value: String,
    },

    /// `Authorization: Bearer <token>`
    Bearer(String),

    /// API key sent as a query parameter (`?apikey=...`)
    Query {
        /// Parameter name
        param: String,
        /// Secret value
        value: String,
    },

    /// Session cookie (`SID=...`)
    Cookie {
        /// Cookie name
        name: String,
        /// Session value
        value: String,
    },
}

impl Credential {
    /// `X-Api-Key` header, used by the *arr family and Overseerr
    #[must_use]
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::header("X-Api-Key", key)
    }

    /// API key in a custom header
    #[must_use]
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Bearer token
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// API key as a query parameter
    #[must_use]
    pub fn query(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Query {
            param: param.into(),
            value: value.into(),
        }
    }

    /// Session cookie
    #[must_use]
    pub fn cookie(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Cookie {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The secret part of the credential
    #[must_use]
    pub fn secret(&self) -> &str {
        match self {
            Self::Header { value, .. } | Self::Query { value, .. } | Self::Cookie { value, .. } => {
                value
            }
            Self::Bearer(token) => token,
        }
    }

    /// Returns true if the secret is empty or whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.secret().trim().is_empty()
    }

    /// Short label for the scheme, safe to log
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Header { .. } => "header",
            Self::Bearer(_) => "bearer",
            Self::Query { .. } => "query",
            Self::Cookie { .. } => "cookie",
        }
    }

    /// Secret with everything but the last four characters hidden
    #[must_use]
    pub fn masked(&self) -> String {
        let secret = self.secret();
        let chars: Vec<char> = secret.chars().collect();
        if chars.len() > 8 {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("****{tail}")
        } else {
            "****".to_string()
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .field("value", &"<redacted>")
                .finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
            Self::Query { param, .. } => f
                .debug_struct("Query")
                .field("param", param)
                .field("value", &"<redacted>")
                .finish(),
            Self::Cookie { name, .. } => f
                .debug_struct("Cookie")
                .field("name", name)
                .field("value", &"<redacted>")
                .finish(),
        }
    }
}
