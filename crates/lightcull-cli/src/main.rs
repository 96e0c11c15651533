mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lightcull", about = "Astro light-frame quality analyzer and culler")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a directory of light frames and write a report log
    Analyze(commands::analyze::AnalyzeArgs),
    /// Print the results stored in a report log
    Report(commands::report::ReportArgs),
    /// Suggest a best subset from a report log
    Recommend(commands::recommend::RecommendArgs),
    /// Apply a recommendation to a report log (and optionally to files)
    Apply(commands::apply::ApplyArgs),
    /// Print or save a default analysis config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Report(args) => commands::report::run(args),
        Commands::Recommend(args) => commands::recommend::run(args),
        Commands::Apply(args) => commands::apply::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
