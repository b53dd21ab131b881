//! Targets command implementation

use anyhow::{Context, Result};

use pr_core::PolicyReporterClient;

use crate::output::{format_targets, OutputFormat};

/// Execute the targets command
pub async fn targets_command(client: &PolicyReporterClient, format: OutputFormat) -> Result<()> {
    let targets = client
        .targets()
        .await
        .context("Failed to fetch targets")?;

    println!("{}", format_targets(&targets, format)?);
    Ok(())
}
