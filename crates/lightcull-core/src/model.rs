use std::fmt;

use serde::{Deserialize, Serialize};

/// Analysis outcome for a file: either metrics were computed, or the file
/// could not be processed at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Selection decision. `None` on a row means "pending": no selection pass
/// has run yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Kept,
    Rejected,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kept => write!(f, "kept"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Why a row was rejected. The first rejection reason recorded wins; later
/// passes never overwrite it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    LowSnr,
    TrailDetected,
    NotRecommended,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowSnr => write!(f, "low_snr"),
            Self::TrailDetected => write!(f, "trail_detected"),
            Self::NotRecommended => write!(f, "not_recommended"),
        }
    }
}

/// One analysis result per input file. Fixed shape: metrics that were not
/// computed (or came out non-finite) are `None`, never zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// File name without directories.
    pub file: String,
    /// Absolute path as discovered.
    pub path: String,
    /// Path relative to the analysis input root.
    pub rel_path: String,

    pub status: Status,
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub rejected_reason: Option<RejectReason>,
    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(default)]
    pub snr: Option<f64>,
    #[serde(default)]
    pub sky_bg: Option<f64>,
    #[serde(default)]
    pub sky_noise: Option<f64>,
    #[serde(default)]
    pub signal_pixels: Option<u64>,
    #[serde(default)]
    pub starcount: Option<u64>,
    #[serde(default)]
    pub fwhm: Option<f64>,
    #[serde(default)]
    pub ecc: Option<f64>,
    /// Number of stars behind the fwhm/ecc medians.
    #[serde(default)]
    pub n_star_ecc: Option<usize>,

    #[serde(default)]
    pub has_trails: bool,
    #[serde(default)]
    pub num_trails: usize,

    #[serde(default)]
    pub bortle: Option<u8>,

    // Header provenance, forwarded for stack-plan consumers.
    #[serde(default)]
    pub ra: Option<f64>,
    #[serde(default)]
    pub dec: Option<f64>,
    #[serde(default)]
    pub exposure: Option<f64>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub date_obs: Option<String>,
    #[serde(default)]
    pub telescope: Option<String>,
}

impl ResultRow {
    /// A blank `status=ok` row for the given identity; metrics unfilled.
    pub fn pending(file: String, path: String, rel_path: String) -> Self {
        Self {
            file,
            path,
            rel_path,
            status: Status::Ok,
            action: None,
            rejected_reason: None,
            error_message: None,
            snr: None,
            sky_bg: None,
            sky_noise: None,
            signal_pixels: None,
            starcount: None,
            fwhm: None,
            ecc: None,
            n_star_ecc: None,
            has_trails: false,
            num_trails: 0,
            bortle: None,
            ra: None,
            dec: None,
            exposure: None,
            filter: None,
            temperature: None,
            date_obs: None,
            telescope: None,
        }
    }

    /// A `status=error` row; all metrics stay `None` by invariant.
    pub fn failed(file: String, path: String, rel_path: String, message: String) -> Self {
        let mut row = Self::pending(file, path, rel_path);
        row.status = Status::Error;
        row.error_message = Some(message);
        row
    }

    /// Finite SNR value, if the metric was computed and is usable.
    pub fn finite_snr(&self) -> Option<f64> {
        self.snr.filter(|v| v.is_finite())
    }

    /// Eligibility for the recommendation pass: analyzed fine, currently
    /// kept, never rejected, with a usable SNR.
    pub fn is_recommendation_eligible(&self) -> bool {
        self.status == Status::Ok
            && self.action == Some(Action::Kept)
            && self.rejected_reason.is_none()
            && self.finite_snr().is_some()
    }
}

/// Store a metric, mapping non-finite values to "not computed".
pub fn metric(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
