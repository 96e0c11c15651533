use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_FWHM_GUESS, DEFAULT_ROUNDHI, DEFAULT_SHARPHI, DEFAULT_SHARPLO,
    DEFAULT_THRESHOLD_SIGMA, FWHM_PER_SIGMA, KERNEL_SIGMA_RADIUS, PARALLEL_PIXEL_THRESHOLD,
};

/// Point-source candidate accepted by the shape filters.
#[derive(Clone, Debug)]
pub struct StarCandidate {
    /// Flux-weighted centroid, image coordinates (col, row).
    pub x: f64,
    pub y: f64,
    /// Matched-kernel amplitude estimate above background.
    pub flux: f64,
    /// Peak concentration relative to the matched response. Hot pixels
    /// score well above 1, extended blobs well below the lower bound.
    pub sharpness: f64,
    /// Width asymmetry of the marginal profiles (x vs y).
    pub roundness1: f64,
    /// Diagonal quadrant asymmetry of the background-subtracted cutout.
    pub roundness2: f64,
}

/// Detection and shape-filter parameters.
///
/// The star-count metric and the PSF shape pass share one config so both
/// always see the same candidate set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StarFinderConfig {
    /// Expected star FWHM in pixels; sizes the matched kernel.
    #[serde(default = "default_fwhm")]
    pub fwhm: f64,
    /// Detection threshold in units of the background noise.
    #[serde(default = "default_threshold_sigma")]
    pub threshold_sigma: f64,
    #[serde(default = "default_sharplo")]
    pub sharplo: f64,
    #[serde(default = "default_sharphi")]
    pub sharphi: f64,
    /// Bound on |roundness1| and |roundness2|.
    #[serde(default = "default_roundhi")]
    pub roundhi: f64,
}

fn default_fwhm() -> f64 {
    DEFAULT_FWHM_GUESS
}
fn default_threshold_sigma() -> f64 {
    DEFAULT_THRESHOLD_SIGMA
}
fn default_sharplo() -> f64 {
    DEFAULT_SHARPLO
}
fn default_sharphi() -> f64 {
    DEFAULT_SHARPHI
}
fn default_roundhi() -> f64 {
    DEFAULT_ROUNDHI
}

impl Default for StarFinderConfig {
    fn default() -> Self {
        Self {
            fwhm: DEFAULT_FWHM_GUESS,
            threshold_sigma: DEFAULT_THRESHOLD_SIGMA,
            sharplo: DEFAULT_SHARPLO,
            sharphi: DEFAULT_SHARPHI,
            roundhi: DEFAULT_ROUNDHI,
        }
    }
}

/// Lowered circular Gaussian kernel, normalized so that convolving a star
/// whose profile matches the kernel returns its peak amplitude.
struct MatchedKernel {
    radius: usize,
    /// Weights over the (2r+1)^2 box; zero outside the circular footprint.
    weights: Vec<f64>,
    /// Footprint membership mask, same layout as `weights`.
    footprint: Vec<bool>,
    /// 1-D mean-subtracted Gaussian for marginal amplitude fits.
    marginal: Vec<f64>,
}

impl MatchedKernel {
    fn build(fwhm: f64) -> Self {
        let sigma = fwhm.max(0.5) / FWHM_PER_SIGMA;
        let radius = ((KERNEL_SIGMA_RADIUS * sigma).ceil() as usize).max(2);
        let size = 2 * radius + 1;
        let r2_max = (radius as f64) * (radius as f64);
        let denom = 2.0 * sigma * sigma;

        let mut gauss = vec![0.0; size * size];
        let mut footprint = vec![false; size * size];
        let mut count = 0usize;
        let mut sum = 0.0;

        for di in -(radius as isize)..=(radius as isize) {
            for dj in -(radius as isize)..=(radius as isize) {
                let idx = (di + radius as isize) as usize * size + (dj + radius as isize) as usize;
                let r2 = (di * di + dj * dj) as f64;
                if r2 <= r2_max {
                    let g = (-r2 / denom).exp();
                    gauss[idx] = g;
                    footprint[idx] = true;
                    sum += g;
                    count += 1;
                }
            }
        }

        let mean = sum / count as f64;
        let norm: f64 = gauss
            .iter()
            .zip(footprint.iter())
            .filter(|(_, &m)| m)
            .map(|(&g, _)| (g - mean) * (g - mean))
            .sum();

        let weights = gauss
            .iter()
            .zip(footprint.iter())
            .map(|(&g, &m)| if m { (g - mean) / norm } else { 0.0 })
            .collect();

        let mut marginal = Vec::with_capacity(size);
        let mut msum = 0.0;
        for dj in -(radius as isize)..=(radius as isize) {
            let g = (-((dj * dj) as f64) / denom).exp();
            marginal.push(g);
            msum += g;
        }
        let mmean = msum / size as f64;
        for v in &mut marginal {
            *v -= mmean;
        }

        Self {
            radius,
            weights,
            footprint,
            marginal,
        }
    }
}

/// Detect point-source candidates above `background + threshold_sigma * noise`
/// and filter by sharpness/roundness. Empty result is not an error; a
/// non-positive or non-finite `noise` disables detection entirely.
pub fn find_stars(
    data: &Array2<f32>,
    config: &StarFinderConfig,
    background: f64,
    noise: f64,
) -> Vec<StarCandidate> {
    if !background.is_finite() || !noise.is_finite() || noise <= 0.0 {
        return Vec::new();
    }

    let (h, w) = data.dim();
    let kernel = MatchedKernel::build(config.fwhm);
    let r = kernel.radius;
    if h < 2 * r + 3 || w < 2 * r + 3 {
        return Vec::new();
    }

    let density = convolve_matched(data, &kernel, background);
    let threshold = config.threshold_sigma * noise;

    // Strict local maxima of the matched response, away from the border.
    let mut candidates = Vec::new();
    for row in (r + 1)..(h - r - 1) {
        for col in (r + 1)..(w - r - 1) {
            let peak = density[[row, col]];
            if peak <= threshold || !is_local_max(&density, row, col, peak) {
                continue;
            }
            if let Some(candidate) = measure_candidate(data, &kernel, background, row, col, peak) {
                let passes = candidate.sharpness > config.sharplo
                    && candidate.sharpness < config.sharphi
                    && candidate.roundness1.abs() < config.roundhi
                    && candidate.roundness2.abs() < config.roundhi;
                if passes {
                    candidates.push(candidate);
                }
            }
        }
    }
    candidates
}

fn is_local_max(density: &Array2<f64>, row: usize, col: usize, peak: f64) -> bool {
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let nr = (row as isize + dr) as usize;
            let nc = (col as isize + dc) as usize;
            if density[[nr, nc]] >= peak {
                return false;
            }
        }
    }
    true
}

fn convolve_matched(data: &Array2<f32>, kernel: &MatchedKernel, background: f64) -> Array2<f64> {
    let (h, w) = data.dim();
    let r = kernel.radius;
    let size = 2 * r + 1;
    let mut density = Array2::<f64>::zeros((h, w));

    let convolve_row = |row: usize, out_row: &mut [f64]| {
        if row < r || row >= h - r {
            return;
        }
        for (col, out) in out_row.iter_mut().enumerate().take(w - r).skip(r) {
            let mut acc = 0.0;
            for ki in 0..size {
                let src_row = row + ki - r;
                for kj in 0..size {
                    let wgt = kernel.weights[ki * size + kj];
                    if wgt != 0.0 {
                        let v = data[[src_row, col + kj - r]] as f64 - background;
                        acc += v * wgt;
                    }
                }
            }
            *out = acc;
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f64>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut buf = vec![0.0; w];
                convolve_row(row, &mut buf);
                buf
            })
            .collect();
        for (row, buf) in rows.into_iter().enumerate() {
            for (col, v) in buf.into_iter().enumerate() {
                density[[row, col]] = v;
            }
        }
    } else {
        let mut buf = vec![0.0; w];
        for row in 0..h {
            buf.iter_mut().for_each(|v| *v = 0.0);
            convolve_row(row, &mut buf);
            for (col, &v) in buf.iter().enumerate() {
                density[[row, col]] = v;
            }
        }
    }

    density
}

/// Shape statistics for one detected peak. `peak` is the matched-kernel
/// response at the detection position.
fn measure_candidate(
    data: &Array2<f32>,
    kernel: &MatchedKernel,
    background: f64,
    row: usize,
    col: usize,
    peak: f64,
) -> Option<StarCandidate> {
    let r = kernel.radius;
    let size = 2 * r + 1;

    // Footprint mean excluding the center pixel, for sharpness.
    let center = data[[row, col]] as f64 - background;
    let mut ring_sum = 0.0;
    let mut ring_count = 0usize;

    // Marginal sums over the square box, and quadrant sums of the
    // positive-clipped cutout.
    let mut mx = vec![0.0; size];
    let mut my = vec![0.0; size];
    let mut quad_main = 0.0; // di*dj > 0
    let mut quad_anti = 0.0; // di*dj < 0
    let mut flux_sum = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for di in -(r as isize)..=(r as isize) {
        for dj in -(r as isize)..=(r as isize) {
            let v = data[[(row as isize + di) as usize, (col as isize + dj) as usize]] as f64
                - background;
            let ki = (di + r as isize) as usize;
            let kj = (dj + r as isize) as usize;

            if kernel.footprint[ki * size + kj] && !(di == 0 && dj == 0) {
                ring_sum += v;
                ring_count += 1;
            }

            mx[kj] += v;
            my[ki] += v;

            let pos = v.max(0.0);
            flux_sum += pos;
            cx += pos * dj as f64;
            cy += pos * di as f64;
            if di * dj > 0 {
                quad_main += pos;
            } else if di * dj < 0 {
                quad_anti += pos;
            }
        }
    }

    if peak <= 0.0 || ring_count == 0 {
        return None;
    }
    let sharpness = (center - ring_sum / ring_count as f64) / peak;

    // Amplitudes of 1-D lowered-Gaussian fits to the marginal sums.
    let k_norm: f64 = kernel.marginal.iter().map(|k| k * k).sum();
    let hx: f64 = mx
        .iter()
        .zip(kernel.marginal.iter())
        .map(|(m, k)| m * k)
        .sum::<f64>()
        / k_norm;
    let hy: f64 = my
        .iter()
        .zip(kernel.marginal.iter())
        .map(|(m, k)| m * k)
        .sum::<f64>()
        / k_norm;
    if hx + hy <= 0.0 {
        return None;
    }
    let roundness1 = 2.0 * (hx - hy) / (hx + hy);

    let quad_total = quad_main + quad_anti;
    let roundness2 = if quad_total > 0.0 {
        (quad_main - quad_anti) / quad_total
    } else {
        0.0
    };

    let (x, y) = if flux_sum > 0.0 {
        (col as f64 + cx / flux_sum, row as f64 + cy / flux_sum)
    } else {
        (col as f64, row as f64)
    };

    Some(StarCandidate {
        x,
        y,
        flux: peak,
        sharpness,
        roundness1,
        roundness2,
    })
}
