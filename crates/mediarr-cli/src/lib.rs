//! # mediarr-cli
//!
//! Command-line front end for the mediarr client.
//!
//! ## Features
//!
//! - **Raw calls**: `mediarr get sonarr /series` through the resilient client
//! - **Health checks**: `mediarr status radarr`
//! - **Configuration**: environment variables, a TOML file, or flags
//! - **Multiple output formats**: pretty, JSON, YAML

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
