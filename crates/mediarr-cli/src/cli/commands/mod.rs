//! Command implementations.

pub mod config;
pub mod get;
pub mod services;
pub mod status;

use anyhow::Context as _;
use mediarr::{ClassifiedError, MediaClient, Service};
use tracing::debug;

use crate::config::{Config, Overrides};
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration file
    pub config: Config,

    /// Output format
    pub output_format: OutputFormat,

    /// `--timeout-ms` override
    pub timeout_ms: Option<u64>,

    /// `--max-retries` override
    pub max_retries: Option<u32>,

    /// Disable colors
    pub no_color: bool,
}

impl Context {
    /// Create a client for `service` from environment, file and flags.
    pub fn client(&self, service: Service) -> anyhow::Result<MediaClient> {
        let overrides = Overrides {
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
        };
        let config = self.config.client_config(service, overrides).with_context(|| {
            format!(
                "Set {} and {}, or run `mediarr config set {service} url <URL>`",
                service.url_env(),
                service.credential_env()
            )
        })?;

        debug!(
            %service,
            base_url = %config.base_url,
            timeout_ms = u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
            max_retries = config.retry.max_retries,
            requests_per_second = config.requests_per_second,
            "building client"
        );

        Ok(MediaClient::new(config)?)
    }
}

/// Attach the error kind so scripts can tell failures apart.
pub fn describe(error: ClassifiedError) -> anyhow::Error {
    let kind = error.kind();
    anyhow::Error::new(error).context(format!("request failed ({kind})"))
}
