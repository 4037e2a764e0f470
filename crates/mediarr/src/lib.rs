//! Resilient Rust client core for media-automation service APIs.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mediarr::{MediaClient, RequestSpec, Service};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads SONARR_URL and SONARR_API_KEY
//!     let sonarr = MediaClient::from_env(Service::Sonarr)?;
//!
//!     let status: serde_json::Value = sonarr.get("/system/status").await?;
//!     println!("Sonarr {}", status["version"]);
//!
//!     let missing: serde_json::Value = sonarr
//!         .execute(RequestSpec::get("/wanted/missing").query("pageSize", 10))
//!         .await?;
//!     println!("{} missing episodes", missing["totalRecords"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/mediarr/0.3.0")]

// Re-export core types
pub use mediarr_core::*;

// Re-export client
pub use mediarr_client::{ClientConfig, MediaClient, RateLimiter, RetryConfig};

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;
