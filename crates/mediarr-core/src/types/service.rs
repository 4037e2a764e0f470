use super::{Credential, RequestSpec};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A supported backend service.
///
/// Carries what differs between backends at construction time: where the
/// API lives under the base URL, how it authenticates, and which
/// environment variables configure it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// TV series manager
    Sonarr,
    /// Movie manager
    Radarr,
    /// Indexer manager
    Prowlarr,
    /// Media request manager
    Overseerr,
    /// Push notification server
    Gotify,
    /// Torrent client
    #[serde(rename = "qbittorrent")]
    QBittorrent,
    /// Usenet downloader
    Sabnzbd,
    /// Plex monitoring
    Tautulli,
    /// The Movie Database
    Tmdb,
}

impl Service {
    /// Every supported service
    pub const ALL: [Self; 9] = [
        Self::Sonarr,
        Self::Radarr,
        Self::Prowlarr,
        Self::Overseerr,
        Self::Gotify,
        Self::QBittorrent,
        Self::Sabnzbd,
        Self::Tautulli,
        Self::Tmdb,
    ];

    /// Lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sonarr => "sonarr",
            Self::Radarr => "radarr",
            Self::Prowlarr => "prowlarr",
            Self::Overseerr => "overseerr",
            Self::Gotify => "gotify",
            Self::QBittorrent => "qbittorrent",
            Self::Sabnzbd => "sabnzbd",
            Self::Tautulli => "tautulli",
            Self::Tmdb => "tmdb",
        }
    }

    /// Prefix of the environment variables configuring this service
    #[must_use]
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Sonarr => "SONARR",
            Self::Radarr => "RADARR",
            Self::Prowlarr => "PROWLARR",
            Self::Overseerr => "OVERSEERR",
            Self::Gotify => "GOTIFY",
            Self::QBittorrent => "QBITTORRENT",
            Self::Sabnzbd => "SABNZBD",
            Self::Tautulli => "TAUTULLI",
            Self::Tmdb => "TMDB",
        }
    }

    /// Environment variable holding the base URL
    #[must_use]
    pub fn url_env(self) -> String {
        format!("{}_URL", self.env_prefix())
    }

    /// Environment variable holding the credential
    #[must_use]
    pub fn credential_env(self) -> String {
        let suffix = match self {
            Self::Gotify => "TOKEN",
            Self::QBittorrent => "SID",
            Self::Tmdb => "ACCESS_TOKEN",
            _ => "API_KEY",
        };
        format!("{}_{suffix}", self.env_prefix())
    }

    /// Path appended to the base URL before every request path
    #[must_use]
    pub const fn api_prefix(self) -> &'static str {
        match self {
            Self::Sonarr | Self::Radarr => "/api/v3",
            Self::Prowlarr | Self::Overseerr => "/api/v1",
            Self::QBittorrent | Self::Tautulli => "/api/v2",
            Self::Sabnzbd => "/api",
            Self::Tmdb => "/3",
            Self::Gotify => "",
        }
    }

    /// Base URL to use when none is configured
    #[must_use]
    pub const fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::Tmdb => Some("https://api.themoviedb.org"),
            _ => None,
        }
    }

    /// Wrap a secret in this service's authentication scheme
    #[must_use]
    pub fn credential(self, secret: impl Into<String>) -> Credential {
        match self {
            Self::Sonarr | Self::Radarr | Self::Prowlarr | Self::Overseerr => {
                Credential::api_key(secret)
            }
            Self::Gotify => Credential::header("X-Gotify-Key", secret),
            Self::QBittorrent => Credential::cookie("SID", secret),
            Self::Sabnzbd | Self::Tautulli => Credential::query("apikey", secret),
            Self::Tmdb => Credential::bearer(secret),
        }
    }

    /// A cheap read-only call that succeeds when the service is reachable
    /// and the credential is accepted
    #[must_use]
    pub fn health_request(self) -> RequestSpec {
        match self {
            Self::Sonarr | Self::Radarr | Self::Prowlarr => RequestSpec::get("/system/status"),
            Self::Overseerr => RequestSpec::get("/status"),
            Self::Gotify => RequestSpec::get("/health"),
            Self::QBittorrent => RequestSpec::get("/app/webapiVersion"),
            Self::Sabnzbd => RequestSpec::get("")
                .query("mode", "version")
                .query("output", "json"),
            Self::Tautulli => RequestSpec::get("").query("cmd", "status"),
            Self::Tmdb => RequestSpec::get("/configuration"),
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when parsing an unknown service name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service: {0}")]
pub struct UnknownService(pub String);

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|service| service.name() == lower)
            .ok_or_else(|| UnknownService(s.to_string()))
    }
}
