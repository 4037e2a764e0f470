//! Check every configured service once.
//!
//! Run with: cargo run -p mediarr --example health_check
//!
//! Configure services with environment variables, e.g. SONARR_URL and
//! SONARR_API_KEY. Unconfigured services are skipped.

use mediarr::{ConfigError, MediaClient, Service};

#[tokio::main]
async fn main() {
    for service in Service::ALL {
        let client = match MediaClient::from_env(service) {
            Ok(client) => client,
            Err(ConfigError::Missing(var)) => {
                println!("{service:<12} skipped ({var} not set)");
                continue;
            }
            Err(e) => {
                println!("{service:<12} misconfigured: {e}");
                continue;
            }
        };

        match client.execute_text(service.health_request()).await {
            Ok(_) => println!("{service:<12} ok"),
            Err(e) => println!("{service:<12} {}: {e}", e.kind()),
        }
    }
}
