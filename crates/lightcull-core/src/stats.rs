use ndarray::Array2;

use crate::consts::{CLIP_MAX_ITERS, CLIP_SIGMA};

/// Robust background statistics for a single exposure.
///
/// `noise > 0` is the gate every downstream metric checks before use;
/// NaN in either field marks the frame as unusable.
#[derive(Clone, Copy, Debug)]
pub struct ImageStats {
    pub background: f64,
    pub noise: f64,
}

impl ImageStats {
    pub fn is_usable(&self) -> bool {
        self.background.is_finite() && self.noise.is_finite() && self.noise > 0.0
    }
}

/// Estimate background (clipped median) and noise (clipped stddev) for an
/// image. Fails soft: degenerate input (empty, all-NaN) yields NaN fields,
/// an all-constant image yields zero noise.
pub fn estimate(data: &Array2<f32>) -> ImageStats {
    let mut values: Vec<f64> = data
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();

    if values.is_empty() {
        return ImageStats {
            background: f64::NAN,
            noise: f64::NAN,
        };
    }

    let (_, median, std) = sigma_clipped_stats(&mut values, CLIP_SIGMA, CLIP_MAX_ITERS);
    ImageStats {
        background: median,
        noise: std,
    }
}

/// Iterative sigma-clipped statistics: (mean, median, stddev).
///
/// Each round rejects samples outside `median +/- sigma * stddev` and stops
/// when nothing is rejected, the spread collapses, or the iteration cap is
/// reached. Clips the vector in place.
pub fn sigma_clipped_stats(values: &mut Vec<f64>, sigma: f64, max_iters: usize) -> (f64, f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN);
    }

    let mut mean = 0.0;
    let mut med = 0.0;
    let mut std = 0.0;

    for _ in 0..max_iters {
        let n = values.len() as f64;
        mean = values.iter().sum::<f64>() / n;
        med = median_in_place(values);
        std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

        if std <= 0.0 {
            break;
        }

        let lo = med - sigma * std;
        let hi = med + sigma * std;
        let before = values.len();
        values.retain(|&v| v >= lo && v <= hi);
        if values.len() == before || values.is_empty() {
            break;
        }
    }

    if values.is_empty() {
        return (mean, med, std);
    }

    let n = values.len() as f64;
    mean = values.iter().sum::<f64>() / n;
    med = median_in_place(values);
    std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    (mean, med, std)
}

/// Median via quickselect. Reorders the slice.
pub fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let upper = values[mid];
    if n % 2 == 1 {
        upper
    } else {
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        0.5 * (lower + upper)
    }
}

/// Median of a borrowed sample set. NaN when empty.
pub fn median_of(values: &[f64]) -> f64 {
    let mut copy: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if copy.is_empty() {
        return f64::NAN;
    }
    median_in_place(&mut copy)
}
