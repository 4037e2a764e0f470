//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use mediarr::Service;

use crate::output::OutputFormat;

/// Probe media-automation services through a rate-limited, retrying client
///
/// Services are configured with <SERVICE>_URL and the service credential
/// variable (e.g. SONARR_API_KEY), or with `mediarr config set`.
#[derive(Parser, Debug)]
#[command(name = "mediarr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Maximum retries after the first attempt
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET an endpoint and print the JSON response
    Get(GetArgs),

    /// Check that a service is reachable and accepts the credential
    Status(StatusArgs),

    /// List supported services and whether they are configured
    Services,

    /// Manage the configuration file
    Config(ConfigArgs),
}

// ============================================================================
// Get command
// ============================================================================

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Service to call
    pub service: Service,

    /// Path below the service's API prefix (e.g. /series)
    pub path: String,

    /// Query parameter, repeatable (e.g. -q pageSize=10)
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

// ============================================================================
// Status command
// ============================================================================

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Service to check
    pub service: Service,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration (credentials masked)
    Show,

    /// Set a value for a service
    Set {
        /// Service to configure
        service: Service,

        /// Setting: url, credential, timeout_ms, max_retries, requests_per_second
        key: String,

        /// New value
        value: String,
    },

    /// Show the configuration file path
    Path,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}
