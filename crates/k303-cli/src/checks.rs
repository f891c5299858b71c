//! # Checks Subcommand
//!
//! Lists the check registry: id, display name, description, and whether
//! the check is implemented under the loaded configuration.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use k303_core::CheckId;
use k303_engine::EngineConfig;

use crate::config::{load_config, Overrides};

/// Arguments for the `k303 checks` subcommand.
#[derive(Args, Debug)]
pub struct ChecksArgs {
    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One row of the listing.
#[derive(Debug, Clone, Serialize)]
pub struct CheckListing {
    pub check_id: CheckId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub implemented: bool,
}

/// The registry listing under `config`, in publication order.
///
/// A combination check counts as implemented only when the configuration
/// supplies its rule.
pub fn list_checks(config: &EngineConfig) -> Vec<CheckListing> {
    let configured: Vec<CheckId> = config.rules().iter().map(|r| r.check_id).collect();
    CheckId::all()
        .iter()
        .map(|&id| CheckListing {
            check_id: id,
            display_name: id.display_name(),
            description: id.description(),
            implemented: !id.is_deferred()
                && (!id.is_combination() || configured.contains(&id)),
        })
        .collect()
}

/// Execute the checks subcommand.
pub fn run_checks(args: &ChecksArgs, config_path: &Path) -> Result<u8> {
    let config = load_config(config_path, &Overrides::default())?;
    let listing = list_checks(&config);

    if args.json {
        let text = serde_json::to_string_pretty(&listing).context("failed to serialize listing")?;
        println!("{text}");
    } else {
        for check in &listing {
            let mark = if check.implemented { "yes" } else { "no" };
            println!(
                "{:<12} {:<40} implemented: {mark}",
                check.check_id.code(),
                check.display_name
            );
            println!("{:<12} {}", "", check.description);
        }
    }
    Ok(0)
}
