//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use mediarr::{ClientConfig, Service};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::output::OutputFormat;

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Per-service settings, keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSettings>,
}

/// Settings for one service. Environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL.
    pub url: Option<String>,

    /// API key, token or session value.
    pub credential: Option<String>,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Maximum retries.
    pub max_retries: Option<u32>,

    /// Sustained request rate.
    pub requests_per_second: Option<f64>,
}

/// Overrides from command-line flags; these win over everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// `--timeout-ms`
    pub timeout_ms: Option<u64>,
    /// `--max-retries`
    pub max_retries: Option<u32>,
}

impl Config {
    /// Get the config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "mediarr", "mediarr")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from a file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Settings stored for a service, if any.
    pub fn service(&self, service: Service) -> Option<&ServiceSettings> {
        self.services.get(service.name())
    }

    /// Update one setting of a service.
    pub fn set(&mut self, service: Service, key: &str, value: &str) -> Result<()> {
        let settings = self.services.entry(service.name().to_string()).or_default();

        match key {
            "url" => settings.url = Some(value.to_string()),
            "credential" | "api_key" | "token" => settings.credential = Some(value.to_string()),
            "timeout_ms" => settings.timeout_ms = Some(value.parse()?),
            "max_retries" => settings.max_retries = Some(value.parse()?),
            "requests_per_second" => settings.requests_per_second = Some(value.parse()?),
            _ => anyhow::bail!(
                "Unknown setting: {}\n\n\
                 Available settings:\n  \
                 url                 - Base URL of the service\n  \
                 credential          - API key, token or session value\n  \
                 timeout_ms          - Per-attempt timeout\n  \
                 max_retries         - Retries after the first attempt\n  \
                 requests_per_second - Sustained request rate",
                key
            ),
        }

        Ok(())
    }

    /// Build a client configuration from the process environment, falling
    /// back to this file.
    pub fn client_config(&self, service: Service, overrides: Overrides) -> Result<ClientConfig> {
        self.client_config_with(service, overrides, |key| std::env::var(key).ok())
    }

    /// Build a client configuration: `env` first, then this file, then
    /// `overrides` on top.
    pub fn client_config_with<F>(
        &self,
        service: Service,
        overrides: Overrides,
        env: F,
    ) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = self.service(service).cloned().unwrap_or_default();
        let prefix = service.env_prefix();

        let from_file = |key: &str| -> Option<String> {
            if key == service.url_env() {
                settings.url.clone()
            } else if key == service.credential_env() {
                settings.credential.clone()
            } else if key == format!("{prefix}_TIMEOUT_MS") {
                settings.timeout_ms.map(|v| v.to_string())
            } else if key == format!("{prefix}_MAX_RETRIES") {
                settings.max_retries.map(|v| v.to_string())
            } else if key == format!("{prefix}_REQUESTS_PER_SECOND") {
                settings.requests_per_second.map(|v| v.to_string())
            } else {
                None
            }
        };

        let lookup = |key: &str| env(key).or_else(|| from_file(key));
        let mut config = ClientConfig::from_env_with(service, lookup)
            .with_context(|| format!("{service} is not configured"))?;

        if let Some(ms) = overrides.timeout_ms {
            config = config.timeout(Duration::from_millis(ms));
        }
        if let Some(max) = overrides.max_retries {
            config = config.max_retries(max);
        }
        config.validate()?;

        Ok(config)
    }
}
