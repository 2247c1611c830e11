use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::{
    outline::source::{load_forest, JsonOutlineSource},
    rollup::{json::hierarchy_json, ClockForest},
};

use super::{resolve_scope, ScopeArgs};

#[derive(Debug, Parser)]
pub struct ExportCommand {
    #[command(flatten)]
    scope: ScopeArgs,
    #[arg(
        short,
        long,
        help = "Write the json document here instead of standard output"
    )]
    output: Option<PathBuf>,
}

/// Command to process `export`. Serializes the aggregated hierarchy with
/// per-node shares, ready for external chart tooling.
pub async fn process_export_command(
    ExportCommand { scope, output }: ExportCommand,
) -> Result<()> {
    let resolved = resolve_scope(scope)?;
    let forest = load_forest(&JsonOutlineSource, &resolved.files).await;
    let tree = ClockForest::aggregate(&forest, &resolved.window);
    if tree.total_hours() <= 0. {
        debug!("Nothing tracked for {}, exporting anyway", resolved.period);
    }

    let document = serde_json::to_string_pretty(&hierarchy_json(&tree))?;
    match output {
        Some(path) => tokio::fs::write(path, document).await?,
        None => println!("{document}"),
    }
    Ok(())
}
