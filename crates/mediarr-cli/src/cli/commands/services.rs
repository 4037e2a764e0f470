//! `mediarr services` - list supported services.

use anyhow::Result;
use mediarr::Service;
use serde::Serialize;

use super::Context;
use crate::config::Overrides;
use crate::output::{self, label, OutputFormat};

#[derive(Debug, Serialize)]
struct ServiceRow {
    service: Service,
    url_env: String,
    credential_env: String,
    auth: &'static str,
    configured: bool,
}

pub fn execute(ctx: Context) -> Result<()> {
    let rows: Vec<ServiceRow> = Service::ALL
        .into_iter()
        .map(|service| ServiceRow {
            service,
            url_env: service.url_env(),
            credential_env: service.credential_env(),
            auth: service.credential(String::new()).scheme(),
            configured: ctx
                .config
                .client_config(service, Overrides::default())
                .is_ok(),
        })
        .collect();

    match ctx.output_format {
        OutputFormat::Pretty => {
            println!(
                "{:<12} {:<8} {:<26} {}",
                label("SERVICE", ctx.no_color),
                label("AUTH", ctx.no_color),
                label("CREDENTIAL VARIABLE", ctx.no_color),
                label("CONFIGURED", ctx.no_color)
            );
            for row in &rows {
                println!(
                    "{:<12} {:<8} {:<26} {}",
                    row.service.name(),
                    row.auth,
                    row.credential_env,
                    if row.configured { "yes" } else { "no" }
                );
            }
        }
        format => println!("{}", output::render(&rows, format)?),
    }

    Ok(())
}
