use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lightcull_core::actions::{apply_rejected_files, RejectDisposition};
use lightcull_core::model::RejectReason;
use lightcull_core::report::{reload_rows, write_log};
use lightcull_core::selection::apply_recommendation;

use super::recommend::criteria_from_args;
use crate::summary::print_run_summary;

#[derive(Args)]
pub struct ApplyArgs {
    /// Report log file to read and append the new state to
    pub log: PathBuf,

    /// Keep frames above this SNR percentile
    #[arg(long, default_value = "20")]
    pub snr_pct: f64,

    /// Keep frames below this FWHM percentile
    #[arg(long, default_value = "80")]
    pub fwhm_pct: f64,

    /// Keep frames below this eccentricity percentile
    #[arg(long, default_value = "80")]
    pub ecc_pct: f64,

    /// Also require a star count above this percentile
    #[arg(long)]
    pub starcount_pct: Option<f64>,

    /// Move files rejected by the recommendation into this directory
    #[arg(long)]
    pub reject_dir: Option<PathBuf>,

    /// Delete files rejected by the recommendation (wins over --reject-dir)
    #[arg(long)]
    pub delete: bool,
}

pub fn run(args: &ApplyArgs) -> Result<()> {
    let mut rows = reload_rows(&args.log)
        .with_context(|| format!("Failed to reload results from {}", args.log.display()))?;

    let criteria =
        criteria_from_args(args.snr_pct, args.fwhm_pct, args.ecc_pct, args.starcount_pct);
    let rejected = apply_recommendation(&mut rows, &criteria);
    println!("Recommendation applied: {rejected} frame(s) rejected");

    if args.delete || args.reject_dir.is_some() {
        let disposition = if args.delete {
            RejectDisposition::Delete
        } else {
            RejectDisposition::Move
        };
        let acted = apply_rejected_files(
            &rows,
            RejectReason::NotRecommended,
            disposition,
            args.reject_dir.as_deref(),
        )?;
        println!("File action applied to {acted} file(s)");
    }

    write_log(&args.log, &rows)
        .with_context(|| format!("Failed to append updated state to {}", args.log.display()))?;
    print_run_summary(&rows);
    println!("Updated report appended to {}", args.log.display());

    Ok(())
}
