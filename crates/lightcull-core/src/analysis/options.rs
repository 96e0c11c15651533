use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::detect::StarFinderConfig;
use crate::selection::SnrSelection;
use crate::trails::TrailParams;

/// Everything a single analysis run needs. GUIs and the CLI both build
/// this; the core never reads global state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub input_dir: PathBuf,
    pub output_log: PathBuf,

    #[serde(default)]
    pub include_subfolders: bool,

    #[serde(default = "default_true")]
    pub analyze_snr: bool,
    #[serde(default)]
    pub snr_selection: SnrSelection,

    #[serde(default)]
    pub detect_trails: bool,
    #[serde(default)]
    pub trail: TrailParams,

    #[serde(default)]
    pub starfind: StarFinderConfig,

    /// Reject-file handling; `delete_rejected` wins over `move_rejected`.
    #[serde(default)]
    pub move_rejected: bool,
    #[serde(default)]
    pub delete_rejected: bool,
    #[serde(default)]
    pub snr_reject_dir: Option<PathBuf>,
    #[serde(default)]
    pub trail_reject_dir: Option<PathBuf>,
    #[serde(default)]
    pub apply_snr_action_immediately: bool,
    #[serde(default)]
    pub apply_trail_action_immediately: bool,

    /// Bortle tagging: thresholds file plus a site SQM reading. Rows are
    /// tagged only when a reading is supplied.
    #[serde(default)]
    pub use_bortle: bool,
    #[serde(default)]
    pub bortle_path: Option<PathBuf>,
    #[serde(default)]
    pub site_sqm: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl AnalysisOptions {
    pub fn new(input_dir: PathBuf, output_log: PathBuf) -> Self {
        Self {
            input_dir,
            output_log,
            include_subfolders: false,
            analyze_snr: true,
            snr_selection: SnrSelection::default(),
            detect_trails: false,
            trail: TrailParams::default(),
            starfind: StarFinderConfig::default(),
            move_rejected: false,
            delete_rejected: false,
            snr_reject_dir: None,
            trail_reject_dir: None,
            apply_snr_action_immediately: false,
            apply_trail_action_immediately: false,
            use_bortle: false,
            bortle_path: None,
            site_sqm: None,
        }
    }
}
