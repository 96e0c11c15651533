use ndarray::Array2;

use crate::consts::FWHM_PER_SIGMA;
use crate::detect::StarCandidate;
use crate::stats::median_of;

/// Per-image PSF shape summary, aggregated over accepted stars.
#[derive(Clone, Copy, Debug)]
pub struct PsfSummary {
    /// Median FWHM in pixels; NaN when no star could be measured.
    pub fwhm: f64,
    /// Median eccentricity in [0, 1); NaN when no star could be measured.
    pub ecc: f64,
    /// Number of stars that contributed to the medians.
    pub n_used: usize,
}

impl PsfSummary {
    fn empty() -> Self {
        Self {
            fwhm: f64::NAN,
            ecc: f64::NAN,
            n_used: 0,
        }
    }
}

/// Measure FWHM and eccentricity for each candidate via flux-weighted second
/// moments of a background-subtracted cutout, then aggregate by median.
///
/// Stars whose cutout has no positive flux, or whose moment matrix
/// degenerates, are skipped and do not count toward `n_used`.
pub fn measure(
    data: &Array2<f32>,
    candidates: &[StarCandidate],
    background: f64,
    box_radius: usize,
) -> PsfSummary {
    if candidates.is_empty() || !background.is_finite() {
        return PsfSummary::empty();
    }

    let mut fwhm_values = Vec::with_capacity(candidates.len());
    let mut ecc_values = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if let Some((fwhm, ecc)) = measure_star(data, candidate, background, box_radius) {
            fwhm_values.push(fwhm);
            ecc_values.push(ecc);
        }
    }

    if fwhm_values.is_empty() {
        return PsfSummary::empty();
    }

    PsfSummary {
        fwhm: median_of(&fwhm_values),
        ecc: median_of(&ecc_values),
        n_used: fwhm_values.len(),
    }
}

/// Second-moment shape of a single star. Returns (fwhm, eccentricity).
fn measure_star(
    data: &Array2<f32>,
    candidate: &StarCandidate,
    background: f64,
    box_radius: usize,
) -> Option<(f64, f64)> {
    let (h, w) = data.dim();
    let row_c = candidate.y.round() as isize;
    let col_c = candidate.x.round() as isize;
    let r = box_radius as isize;

    let row_lo = (row_c - r).max(0) as usize;
    let row_hi = ((row_c + r + 1).min(h as isize)) as usize;
    let col_lo = (col_c - r).max(0) as usize;
    let col_hi = ((col_c + r + 1).min(w as isize)) as usize;
    if row_lo >= row_hi || col_lo >= col_hi {
        return None;
    }

    // Flux-weighted centroid of the positive residual.
    let mut flux = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for row in row_lo..row_hi {
        for col in col_lo..col_hi {
            let v = (data[[row, col]] as f64 - background).max(0.0);
            flux += v;
            cx += v * col as f64;
            cy += v * row as f64;
        }
    }
    if flux <= 0.0 {
        return None;
    }
    cx /= flux;
    cy /= flux;

    // Flux-weighted covariance of pixel offsets from the centroid.
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for row in row_lo..row_hi {
        for col in col_lo..col_hi {
            let v = (data[[row, col]] as f64 - background).max(0.0);
            if v <= 0.0 {
                continue;
            }
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            sxx += v * dx * dx;
            syy += v * dy * dy;
            sxy += v * dx * dy;
        }
    }
    sxx /= flux;
    syy /= flux;
    sxy /= flux;

    // Eigenvalues of the 2x2 symmetric covariance: major/minor variances.
    let half_trace = 0.5 * (sxx + syy);
    let discriminant = (0.25 * (sxx - syy) * (sxx - syy) + sxy * sxy).sqrt();
    let var_major = half_trace + discriminant;
    let var_minor = (half_trace - discriminant).max(0.0);
    if var_major <= 0.0 || !var_major.is_finite() {
        return None;
    }

    let fwhm = FWHM_PER_SIGMA * 0.5 * (var_major.sqrt() + var_minor.sqrt());
    let ecc = (1.0 - var_minor / var_major).max(0.0).sqrt();
    Some((fwhm, ecc))
}
