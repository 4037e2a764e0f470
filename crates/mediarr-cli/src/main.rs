//! mediarr - probe media-automation services from the command line
//!
//! Every call goes through the same rate-limited, retrying client the
//! library uses.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    mediarr_cli::run().await
}
