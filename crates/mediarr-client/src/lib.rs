//! Resilient HTTP client for media-automation service APIs.
//!
//! This crate provides [`MediaClient`], which wraps one backend (base URL +
//! credential) and runs every call through the same pipeline:
//!
//! 1. wait for the per-client [`RateLimiter`]
//! 2. send the request under a deadline
//! 3. classify the outcome into a [`ClassifiedError`]
//! 4. retry retryable failures with backoff, within the retry budget

#![doc(html_root_url = "https://docs.rs/mediarr-client/0.3.0")]

mod classify;
mod client;
mod config;
pub mod rate_limit;
pub mod retry;

pub use client::MediaClient;
pub use config::*;
pub use mediarr_core::{ClassifiedError, ConfigError, ErrorKind, Result};
pub use rate_limit::RateLimiter;
