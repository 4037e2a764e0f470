//! `mediarr config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;
use mediarr::Credential;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::{self, label, OutputFormat};

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set {
            service,
            key,
            value,
        } => {
            let mut config = Config::load()?;
            config.set(service, &key, &value)?;
            config.save()?;
            println!(
                "{} {service} {key} set.",
                if ctx.no_color {
                    "Success:".to_string()
                } else {
                    "Success:".green().bold().to_string()
                }
            );
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", Config::path()?.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    // Never print stored credentials in full
    let mut masked = ctx.config.clone();
    for settings in masked.services.values_mut() {
        if let Some(secret) = &settings.credential {
            settings.credential = Some(Credential::bearer(secret.as_str()).masked());
        }
    }

    match ctx.output_format {
        OutputFormat::Pretty => {
            println!("{}", label("Current Configuration:", ctx.no_color));
            if masked.services.is_empty() {
                println!("  (no services configured in file)");
            }
            for (name, settings) in &masked.services {
                println!();
                println!("  [{name}]");
                let show = |key: &str, value: Option<String>| {
                    println!(
                        "    {} {}",
                        label(&format!("{key}:"), ctx.no_color),
                        value.unwrap_or_else(|| "(not set)".to_string())
                    );
                };
                show("url", settings.url.clone());
                show("credential", settings.credential.clone());
                show("timeout_ms", settings.timeout_ms.map(|v| v.to_string()));
                show("max_retries", settings.max_retries.map(|v| v.to_string()));
                show(
                    "requests_per_second",
                    settings.requests_per_second.map(|v| v.to_string()),
                );
            }
        }
        format => println!("{}", output::render(&masked, format)?),
    }

    Ok(())
}
