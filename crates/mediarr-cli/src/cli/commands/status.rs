//! `mediarr status` - health check a service.

use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use super::{describe, Context};
use crate::cli::args::StatusArgs;
use crate::output::{self, OutputFormat};

pub async fn execute(ctx: Context, args: StatusArgs) -> Result<()> {
    let service = args.service;
    let client = ctx.client(service)?;

    let started = Instant::now();
    let body = client
        .execute_text(service.health_request())
        .await
        .map_err(describe)?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    // Health endpoints answer JSON or plain text depending on the service
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .unwrap_or_else(|_| serde_json::Value::String(body.trim().to_string()));

    match ctx.output_format {
        OutputFormat::Pretty => {
            let ok = if ctx.no_color {
                "ok".to_string()
            } else {
                "ok".green().bold().to_string()
            };
            println!("{service}: {ok} ({elapsed_ms} ms)");
            if let Some(version) = detail.get("version").and_then(|v| v.as_str()) {
                println!("  version: {version}");
            }
        }
        format => {
            let report = serde_json::json!({
                "service": service,
                "ok": true,
                "elapsed_ms": elapsed_ms,
                "detail": detail,
            });
            println!("{}", output::render(&report, format)?);
        }
    }

    Ok(())
}
