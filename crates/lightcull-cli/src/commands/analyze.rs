use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lightcull_core::analysis::{
    run_analysis, validate_options, AnalysisObserver, AnalysisOptions, ProgressUpdate,
};
use lightcull_core::selection::{SnrSelection, SnrSelectionMode};

use crate::summary::print_run_summary;

#[derive(Clone, ValueEnum)]
pub enum SnrModeArg {
    Percent,
    Threshold,
    KeepAll,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Directory of light frames to analyze
    pub input: PathBuf,

    /// Report log file to append results to
    #[arg(short, long, default_value = "lightcull.log")]
    pub log: PathBuf,

    /// Analysis config file (TOML); command-line flags are ignored when set
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also scan subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// SNR selection mode
    #[arg(long, value_enum, default_value = "percent")]
    pub snr_mode: SnrModeArg,

    /// Percent of frames to keep, or the SNR threshold, per --snr-mode
    #[arg(long, default_value = "80")]
    pub snr_value: f64,

    /// Skip SNR estimation and selection entirely
    #[arg(long)]
    pub no_snr: bool,

    /// Detect satellite/plane trails and reject affected frames
    #[arg(long)]
    pub trails: bool,

    /// Move rejected files into reject directories
    #[arg(long)]
    pub move_rejected: bool,

    /// Delete rejected files (wins over --move-rejected)
    #[arg(long)]
    pub delete_rejected: bool,

    /// Destination for frames rejected on SNR
    #[arg(long)]
    pub snr_reject_dir: Option<PathBuf>,

    /// Destination for frames rejected for trails
    #[arg(long)]
    pub trail_reject_dir: Option<PathBuf>,

    /// Tag each frame with a Bortle class from this site SQM reading
    #[arg(long)]
    pub site_sqm: Option<f64>,

    /// Bortle threshold override file (JSON)
    #[arg(long)]
    pub bortle_config: Option<PathBuf>,
}

struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40}] {pos}%")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl AnalysisObserver for CliObserver {
    fn status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn progress(&self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::Percent(pct) => {
                self.bar.disable_steady_tick();
                self.bar.set_position(pct.round() as u64);
            }
            ProgressUpdate::Indeterminate => {
                self.bar.enable_steady_tick(std::time::Duration::from_millis(120));
            }
        }
    }

    fn log(&self, line: &str) {
        self.bar.println(line);
    }
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let options = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid analysis config")?
    } else {
        build_options_from_args(args)
    };
    validate_options(&options)?;

    println!("Lightcull Analysis");
    println!("  Input:    {}", options.input_dir.display());
    println!("  Log:      {}", options.output_log.display());
    if options.analyze_snr {
        println!(
            "  SNR:      {:?} ({})",
            options.snr_selection.mode, options.snr_selection.value
        );
    } else {
        println!("  SNR:      disabled");
    }
    println!(
        "  Trails:   {}",
        if options.detect_trails { "on" } else { "off" }
    );
    println!();

    let observer = CliObserver::new()?;
    let rows = run_analysis(&options, &observer)?;
    observer.finish();

    print_run_summary(&rows);
    println!("Report appended to {}", options.output_log.display());

    Ok(())
}

fn build_options_from_args(args: &AnalyzeArgs) -> AnalysisOptions {
    let mut options = AnalysisOptions::new(args.input.clone(), args.log.clone());
    options.include_subfolders = args.recursive;
    options.analyze_snr = !args.no_snr;
    options.snr_selection = SnrSelection {
        mode: match args.snr_mode {
            SnrModeArg::Percent => SnrSelectionMode::Percent,
            SnrModeArg::Threshold => SnrSelectionMode::Threshold,
            SnrModeArg::KeepAll => SnrSelectionMode::KeepAll,
        },
        value: args.snr_value,
    };
    options.detect_trails = args.trails;
    options.move_rejected = args.move_rejected;
    options.delete_rejected = args.delete_rejected;
    options.snr_reject_dir = args.snr_reject_dir.clone();
    options.trail_reject_dir = args.trail_reject_dir.clone();
    options.apply_snr_action_immediately = args.move_rejected || args.delete_rejected;
    options.apply_trail_action_immediately = args.move_rejected || args.delete_rejected;
    options.use_bortle = args.site_sqm.is_some();
    options.site_sqm = args.site_sqm;
    options.bortle_path = args.bortle_config.clone();
    options
}
