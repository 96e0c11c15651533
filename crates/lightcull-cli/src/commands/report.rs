use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lightcull_core::report::reload_rows;

use crate::summary::{print_result_table, print_run_summary};

#[derive(Args)]
pub struct ReportArgs {
    /// Report log file to read
    pub log: PathBuf,

    /// Only print the summary, not the per-file table
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run(args: &ReportArgs) -> Result<()> {
    let rows = reload_rows(&args.log)
        .with_context(|| format!("Failed to reload results from {}", args.log.display()))?;

    println!("Loaded {} result(s) from {}", rows.len(), args.log.display());
    println!();

    if !args.summary_only {
        print_result_table(&rows);
    }
    print_run_summary(&rows);

    Ok(())
}
