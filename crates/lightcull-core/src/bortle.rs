//! Bortle sky-darkness classification. Auxiliary metadata only: the class
//! never feeds the quality metrics, it just tags result rows.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Minimum SQM (mag/arcsec^2) per Bortle class. Class 9 is the catch-all.
const DEFAULT_THRESHOLDS: [(u8, f64); 9] = [
    (1, 21.9),
    (2, 21.7),
    (3, 21.3),
    (4, 20.9),
    (5, 20.3),
    (6, 19.5),
    (7, 18.8),
    (8, 18.0),
    (9, 0.0),
];

#[derive(Clone, Debug)]
pub struct BortleScale {
    thresholds: BTreeMap<u8, f64>,
}

impl Default for BortleScale {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.iter().copied().collect(),
        }
    }
}

#[derive(Deserialize)]
struct ThresholdFile(BTreeMap<String, f64>);

impl BortleScale {
    /// Load a threshold override file (JSON map of class -> minimum SQM),
    /// falling back to the built-in table when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)?;
        let parsed: ThresholdFile = serde_json::from_str(&text)?;
        let thresholds = parsed
            .0
            .into_iter()
            .filter_map(|(k, v)| k.parse::<u8>().ok().map(|class| (class, v)))
            .collect();
        Ok(Self { thresholds })
    }

    /// Classify an SQM reading: the darkest class whose threshold the
    /// reading still meets.
    pub fn class_for_sqm(&self, sqm: f64) -> u8 {
        let mut entries: Vec<(u8, f64)> =
            self.thresholds.iter().map(|(&c, &v)| (c, v)).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (class, min_sqm) in &entries {
            if sqm >= *min_sqm {
                return *class;
            }
        }
        self.thresholds.keys().copied().max().unwrap_or(9)
    }

    pub fn class_for_luminance(&self, ucd_per_m2: f64) -> u8 {
        self.class_for_sqm(ucd_to_sqm(ucd_per_m2))
    }
}

/// Convert sky luminance in ucd/m^2 to SQM magnitudes per arcsec^2.
pub fn ucd_to_sqm(ucd_per_m2: f64) -> f64 {
    22.0 - 1.0857 * (ucd_per_m2 / 174.0).ln()
}
