use serde::{Deserialize, Serialize};

use crate::model::{Action, RejectReason, ResultRow, Status};

/// SNR rejection policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnrSelectionMode {
    /// Keep the top `value` percent by SNR, boundary ties included.
    Percent,
    /// Keep rows with `snr >= value`.
    Threshold,
    KeepAll,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SnrSelection {
    pub mode: SnrSelectionMode,
    pub value: f64,
}

impl Default for SnrSelection {
    fn default() -> Self {
        Self {
            mode: SnrSelectionMode::KeepAll,
            value: 80.0,
        }
    }
}

/// Percentile thresholds for the recommendation subset, all in [0, 100].
/// `starcount_pct_min` is `None` when the star-count criterion is disabled.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RecommendationCriteria {
    pub snr_pct_min: f64,
    pub fwhm_pct_max: f64,
    pub ecc_pct_max: f64,
    #[serde(default)]
    pub starcount_pct_min: Option<f64>,
}

impl Default for RecommendationCriteria {
    fn default() -> Self {
        Self {
            snr_pct_min: 20.0,
            fwhm_pct_max: 80.0,
            ecc_pct_max: 80.0,
            starcount_pct_min: None,
        }
    }
}

/// Concrete metric thresholds resolved from the criteria over the eligible
/// subset. `None` when no eligible row carried the metric.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecommendationThresholds {
    pub snr_min: Option<f64>,
    pub fwhm_max: Option<f64>,
    pub ecc_max: Option<f64>,
    pub starcount_min: Option<f64>,
}

/// Linear-interpolation percentile between closest ranks. `values` must be
/// sorted ascending and non-empty.
pub fn percentile_sorted(values: &[f64], pct: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let pct = pct.clamp(0.0, 100.0);
    let rank = pct / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        let frac = rank - lo as f64;
        values[lo] + (values[hi] - values[lo]) * frac
    }
}

/// Apply the SNR rejection policy in place.
///
/// Operates on `status=ok` rows that are not rejected for another reason;
/// rows previously rejected for low SNR are re-evaluated, so re-applying
/// with the same policy is idempotent and a different policy fully
/// supersedes the old decision. Rows without a usable SNR are ineligible
/// and rejected outright (unless the mode keeps everything).
pub fn apply_snr_selection(rows: &mut [ResultRow], selection: &SnrSelection) {
    let reconsidered = |row: &ResultRow| {
        row.status == Status::Ok
            && matches!(row.rejected_reason, None | Some(RejectReason::LowSnr))
    };

    match selection.mode {
        SnrSelectionMode::KeepAll => {
            for row in rows.iter_mut().filter(|r| reconsidered(r)) {
                row.action = Some(Action::Kept);
                row.rejected_reason = None;
            }
        }
        SnrSelectionMode::Threshold => {
            reject_below(rows, selection.value, &reconsidered);
        }
        SnrSelectionMode::Percent => {
            let mut snrs: Vec<f64> = rows
                .iter()
                .filter(|r| reconsidered(r))
                .filter_map(|r| r.finite_snr())
                .collect();
            if snrs.is_empty() {
                // Nothing usable: every reconsidered row is ineligible.
                reject_below(rows, f64::INFINITY, &reconsidered);
                return;
            }
            snrs.sort_unstable_by(|a, b| a.total_cmp(b));
            let keep_pct = selection.value.clamp(0.0, 100.0);
            let threshold = percentile_sorted(&snrs, 100.0 - keep_pct);
            reject_below(rows, threshold, &reconsidered);
        }
    }
}

fn reject_below<F>(rows: &mut [ResultRow], threshold: f64, reconsidered: &F)
where
    F: Fn(&ResultRow) -> bool,
{
    for row in rows.iter_mut() {
        if !reconsidered(row) {
            continue;
        }
        match row.finite_snr() {
            Some(snr) if snr >= threshold => {
                row.action = Some(Action::Kept);
                row.rejected_reason = None;
            }
            _ => {
                row.action = Some(Action::Rejected);
                row.rejected_reason = Some(RejectReason::LowSnr);
            }
        }
    }
}

/// Reject rows with detected trails. A reason already present wins; this
/// pass never overwrites it.
pub fn apply_trail_rejection(rows: &mut [ResultRow]) {
    for row in rows.iter_mut() {
        if row.status == Status::Ok && row.has_trails && row.rejected_reason.is_none() {
            row.action = Some(Action::Rejected);
            row.rejected_reason = Some(RejectReason::TrailDetected);
        }
    }
}

/// Rows that survived every selection pass get an explicit `kept`.
pub fn finalize_pending(rows: &mut [ResultRow]) {
    for row in rows.iter_mut() {
        if row.status == Status::Ok && row.action.is_none() {
            row.action = Some(Action::Kept);
        }
    }
}

/// Compute the recommended subset over the eligible rows.
///
/// Pure function of the rows and criteria: percentile thresholds are drawn
/// from the eligible rows' metric distributions, and a row is recommended
/// iff it clears every enabled criterion. Rows missing an optional metric
/// (fwhm/ecc/starcount) pass that criterion by default; SNR is mandatory.
/// Returns indices into `rows` plus the resolved thresholds.
pub fn recommend(
    rows: &[ResultRow],
    criteria: &RecommendationCriteria,
) -> (Vec<usize>, RecommendationThresholds) {
    let eligible: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_recommendation_eligible())
        .map(|(i, _)| i)
        .collect();

    if eligible.is_empty() {
        return (Vec::new(), RecommendationThresholds::default());
    }

    let collect_sorted = |get: &dyn Fn(&ResultRow) -> Option<f64>| -> Vec<f64> {
        let mut v: Vec<f64> = eligible
            .iter()
            .filter_map(|&i| get(&rows[i]).filter(|x| x.is_finite()))
            .collect();
        v.sort_unstable_by(|a, b| a.total_cmp(b));
        v
    };

    let snrs = collect_sorted(&|r| r.snr);
    let fwhms = collect_sorted(&|r| r.fwhm);
    let eccs = collect_sorted(&|r| r.ecc);
    let starcounts = collect_sorted(&|r| r.starcount.map(|v| v as f64));

    let thresholds = RecommendationThresholds {
        snr_min: (!snrs.is_empty()).then(|| percentile_sorted(&snrs, criteria.snr_pct_min)),
        fwhm_max: (!fwhms.is_empty()).then(|| percentile_sorted(&fwhms, criteria.fwhm_pct_max)),
        ecc_max: (!eccs.is_empty()).then(|| percentile_sorted(&eccs, criteria.ecc_pct_max)),
        starcount_min: match criteria.starcount_pct_min {
            Some(pct) if !starcounts.is_empty() => Some(percentile_sorted(&starcounts, pct)),
            _ => None,
        },
    };

    let recommended = eligible
        .into_iter()
        .filter(|&i| {
            let row = &rows[i];
            let ok_snr = match (row.finite_snr(), thresholds.snr_min) {
                (Some(snr), Some(min)) => snr >= min,
                _ => false,
            };
            let ok_fwhm = match (row.fwhm.filter(|v| v.is_finite()), thresholds.fwhm_max) {
                (Some(fwhm), Some(max)) => fwhm <= max,
                _ => true,
            };
            let ok_ecc = match (row.ecc.filter(|v| v.is_finite()), thresholds.ecc_max) {
                (Some(ecc), Some(max)) => ecc <= max,
                _ => true,
            };
            let ok_starcount = match thresholds.starcount_min {
                Some(min) => row
                    .starcount
                    .map(|count| count as f64 >= min)
                    .unwrap_or(false),
                None => true,
            };
            ok_snr && ok_fwhm && ok_ecc && ok_starcount
        })
        .collect();

    (recommended, thresholds)
}

/// Apply the recommendation: eligible rows outside the recommended subset
/// are rejected as `not_recommended`. Idempotent: re-applying with the same
/// criteria over unchanged rows yields the same assignment, because rows it
/// rejected are re-considered on the next pass.
pub fn apply_recommendation(rows: &mut [ResultRow], criteria: &RecommendationCriteria) -> usize {
    // Re-admit rows this pass rejected earlier so criteria changes undo.
    for row in rows.iter_mut() {
        if row.rejected_reason == Some(RejectReason::NotRecommended) {
            row.rejected_reason = None;
            row.action = Some(Action::Kept);
        }
    }

    let (recommended, _) = recommend(rows, criteria);
    let keep: std::collections::HashSet<usize> = recommended.into_iter().collect();

    let mut rejected = 0;
    for (i, row) in rows.iter_mut().enumerate() {
        if row.is_recommendation_eligible() && !keep.contains(&i) {
            row.action = Some(Action::Rejected);
            row.rejected_reason = Some(RejectReason::NotRecommended);
            rejected += 1;
        }
    }
    rejected
}
