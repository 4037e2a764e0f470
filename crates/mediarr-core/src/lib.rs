//! Core types and error taxonomy for the mediarr API client.
//!
//! This crate provides the foundational types shared by every service
//! integration:
//!
//! - **Errors**: the [`ClassifiedError`] taxonomy returned by the request
//!   pipeline, and [`ConfigError`] for construction-time failures
//! - **Types**: [`RequestSpec`] describing one logical call, the
//!   [`Credential`] schemes and the [`Service`] catalog
//!
//! # Example
//!
//! ```rust,ignore
//! use mediarr_core::{ClassifiedError, ErrorKind, RequestSpec};
//!
//! let spec = RequestSpec::get("/series").query("includeSeasonImages", "false");
//!
//! match client.execute::<Vec<serde_json::Value>>(spec).await {
//!     Ok(series) => println!("{} series", series.len()),
//!     Err(e) if e.kind() == ErrorKind::Unauthorized => eprintln!("check the API key"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/mediarr-core/0.3.0")]

mod error;
pub mod types;

pub use error::{ClassifiedError, ConfigError, ErrorKind, Result};
pub use types::*;
