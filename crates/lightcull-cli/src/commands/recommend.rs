use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::Style;
use lightcull_core::report::reload_rows;
use lightcull_core::selection::{recommend, RecommendationCriteria};

#[derive(Args)]
pub struct RecommendArgs {
    /// Report log file to read
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
}

pub fn criteria_from_args(
    snr_pct: f64,
    fwhm_pct: f64,
    ecc_pct: f64,
    starcount_pct: Option<f64>,
) -> RecommendationCriteria {
    RecommendationCriteria {
        snr_pct_min: snr_pct,
        fwhm_pct_max: fwhm_pct,
        ecc_pct_max: ecc_pct,
        starcount_pct_min: starcount_pct,
    }
}

pub fn run(args: &RecommendArgs) -> Result<()> {
    let rows = reload_rows(&args.log)
        .with_context(|| format!("Failed to reload results from {}", args.log.display()))?;
    let criteria =
        criteria_from_args(args.snr_pct, args.fwhm_pct, args.ecc_pct, args.starcount_pct);
    let (recommended, thresholds) = recommend(&rows, &criteria);

    let header = Style::new().cyan().bold();
    let kept = Style::new().green();

    println!(
        "Recommended {} of {} frame(s):",
        recommended.len(),
        rows.len()
    );
    if let Some(min) = thresholds.snr_min {
        println!("  SNR       >= {min:.2}");
    }
    if let Some(max) = thresholds.fwhm_max {
        println!("  FWHM      <= {max:.2}");
    }
    if let Some(max) = thresholds.ecc_max {
        println!("  Ecc       <= {max:.3}");
    }
    if let Some(min) = thresholds.starcount_min {
        println!("  Stars     >= {min:.0}");
    }
    println!();

    println!("  {}", header.apply_to(format!("{:<40} {:>9} {:>7} {:>6}", "file", "snr", "fwhm", "ecc")));
    for &i in &recommended {
        let row = &rows[i];
        println!(
            "  {} {:>9} {:>7} {:>6}",
            kept.apply_to(format!("{:<40}", row.rel_path)),
            row.snr.map(|v| format!("{v:.2}")).unwrap_or_default(),
            row.fwhm.map(|v| format!("{v:.2}")).unwrap_or_default(),
            row.ecc.map(|v| format!("{v:.3}")).unwrap_or_default(),
        );
    }

    Ok(())
}
