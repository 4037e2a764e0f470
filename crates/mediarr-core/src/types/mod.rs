//! Request description, credential and service types.

mod credential;
mod request;
mod service;

pub use credential::Credential;
pub use request::{HttpMethod, RequestBody, RequestSpec};
pub use service::{Service, UnknownService};
