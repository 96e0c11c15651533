use std::collections::VecDeque;
use std::sync::OnceLock;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    DEFAULT_TRAIL_HIGH_THR, DEFAULT_TRAIL_LINE_GAP, DEFAULT_TRAIL_LINE_LEN, DEFAULT_TRAIL_LOW_THR,
    DEFAULT_TRAIL_SIGMA, DEFAULT_TRAIL_SMALL_EDGE, HOUGH_LINE_WIDTH, HOUGH_NMS_RHO,
    HOUGH_NMS_THETA, HOUGH_THETA_STEP_DEG,
};
use crate::stats::sigma_clipped_stats;

/// Streak detector tunables. Thresholds are in units of the robust spread
/// of the gradient magnitude, lengths and gaps in pixels.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrailParams {
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default = "default_low_thr")]
    pub low_thr: f64,
    #[serde(default = "default_high_thr")]
    pub high_thr: f64,
    #[serde(default = "default_line_len")]
    pub line_len: usize,
    #[serde(default = "default_small_edge")]
    pub small_edge: usize,
    #[serde(default = "default_line_gap")]
    pub line_gap: usize,
}

fn default_sigma() -> f64 {
    DEFAULT_TRAIL_SIGMA
}
fn default_low_thr() -> f64 {
    DEFAULT_TRAIL_LOW_THR
}
fn default_high_thr() -> f64 {
    DEFAULT_TRAIL_HIGH_THR
}
fn default_line_len() -> usize {
    DEFAULT_TRAIL_LINE_LEN
}
fn default_small_edge() -> usize {
    DEFAULT_TRAIL_SMALL_EDGE
}
fn default_line_gap() -> usize {
    DEFAULT_TRAIL_LINE_GAP
}

impl Default for TrailParams {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_TRAIL_SIGMA,
            low_thr: DEFAULT_TRAIL_LOW_THR,
            high_thr: DEFAULT_TRAIL_HIGH_THR,
            line_len: DEFAULT_TRAIL_LINE_LEN,
            small_edge: DEFAULT_TRAIL_SMALL_EDGE,
            line_gap: DEFAULT_TRAIL_LINE_GAP,
        }
    }
}

/// Detection outcome for one image.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrailReport {
    pub has_trails: bool,
    pub num_trails: usize,
}

/// Capability state of the streak backend, resolved once per process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// Compiled out or otherwise absent.
    Missing,
    /// Present but the self-probe could not recover a known streak.
    Incompatible,
}

static AVAILABILITY: OnceLock<Availability> = OnceLock::new();

/// Probe the detector once on a synthetic streak and cache the outcome.
/// Callers treat anything but `Available` as "skip trail detection".
pub fn availability() -> Availability {
    *AVAILABILITY.get_or_init(|| {
        let report = detect(&probe_image(), &probe_params());
        if report.has_trails {
            Availability::Available
        } else {
            warn!("trail detector self-probe failed; trail detection disabled");
            Availability::Incompatible
        }
    })
}

fn probe_image() -> Array2<f32> {
    let n = 128;
    let mut img = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        img[[i, i]] = 1.0;
        if i + 1 < n {
            img[[i, i + 1]] = 1.0;
        }
    }
    img
}

fn probe_params() -> TrailParams {
    TrailParams {
        line_len: 60,
        ..TrailParams::default()
    }
}

/// Detect linear streaks: blur, gradient, hysteresis edges, small-component
/// pruning, then Hough accumulation with collinear-segment merging.
pub fn detect(data: &Array2<f32>, params: &TrailParams) -> TrailReport {
    let (h, w) = data.dim();
    if h < 8 || w < 8 {
        return TrailReport::default();
    }

    let blurred = gaussian_blur(data, params.sigma.max(0.1));
    let magnitude = sobel_magnitude(&blurred);

    // Robust scale of the gradient field sets the hysteresis thresholds.
    let mut samples: Vec<f64> = magnitude.iter().map(|&v| v as f64).collect();
    let (_, med, std) = sigma_clipped_stats(&mut samples, 3.0, 3);
    if !med.is_finite() || !std.is_finite() {
        return TrailReport::default();
    }
    let high = med + params.high_thr * std;
    let low = med + params.low_thr * std;

    let edges = hysteresis_edges(&magnitude, low as f32, high as f32);
    let edges = prune_small_components(&edges, params.small_edge);

    let edge_pixels: Vec<(usize, usize)> = {
        let mut v = Vec::new();
        for row in 0..h {
            for col in 0..w {
                if edges[[row, col]] {
                    v.push((row, col));
                }
            }
        }
        v
    };
    if edge_pixels.len() < params.line_len {
        return TrailReport::default();
    }

    let num_trails = hough_count_trails(&edge_pixels, h, w, params);
    TrailReport {
        has_trails: num_trails > 0,
        num_trails,
    }
}

/// Separable Gaussian blur with clamped borders.
fn gaussian_blur(data: &Array2<f32>, sigma: f64) -> Array2<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let denom = (2.0 * sigma * sigma) as f32;
    let mut sum = 0.0f32;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / denom).exp();
        sum += *k;
    }
    for v in &mut kernel {
        *v /= sum;
    }

    let (h, w) = data.dim();
    let mut pass = Array2::<f32>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            let mut acc = 0.0;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src = (col as isize + ki as isize - radius as isize)
                    .clamp(0, w as isize - 1) as usize;
                acc += data[[row, src]] * kv;
            }
            pass[[row, col]] = acc;
        }
    }
    let mut out = Array2::<f32>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            let mut acc = 0.0;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src = (row as isize + ki as isize - radius as isize)
                    .clamp(0, h as isize - 1) as usize;
                acc += pass[[src, col]] * kv;
            }
            out[[row, col]] = acc;
        }
    }
    out
}

fn sobel_magnitude(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut mag = Array2::<f32>::zeros((h, w));
    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let gx = (data[[row - 1, col + 1]] + 2.0 * data[[row, col + 1]]
                + data[[row + 1, col + 1]])
                - (data[[row - 1, col - 1]] + 2.0 * data[[row, col - 1]] + data[[row + 1, col - 1]]);
            let gy = (data[[row + 1, col - 1]] + 2.0 * data[[row + 1, col]]
                + data[[row + 1, col + 1]])
                - (data[[row - 1, col - 1]] + 2.0 * data[[row - 1, col]] + data[[row - 1, col + 1]]);
            mag[[row, col]] = (gx * gx + gy * gy).sqrt();
        }
    }
    mag
}

/// Canny-style hysteresis: strong pixels seed, weak pixels join by
/// 8-connected flood fill.
fn hysteresis_edges(magnitude: &Array2<f32>, low: f32, high: f32) -> Array2<bool> {
    let (h, w) = magnitude.dim();
    let mut edges = Array2::<bool>::from_elem((h, w), false);
    let mut queue = VecDeque::new();

    for row in 0..h {
        for col in 0..w {
            if magnitude[[row, col]] > high && !edges[[row, col]] {
                edges[[row, col]] = true;
                queue.push_back((row, col));
                while let Some((r, c)) = queue.pop_front() {
                    for dr in -1isize..=1 {
                        for dc in -1isize..=1 {
                            let nr = r as isize + dr;
                            let nc = c as isize + dc;
                            if nr < 0 || nc < 0 || nr >= h as isize || nc >= w as isize {
                                continue;
                            }
                            let (nr, nc) = (nr as usize, nc as usize);
                            if !edges[[nr, nc]] && magnitude[[nr, nc]] > low {
                                edges[[nr, nc]] = true;
                                queue.push_back((nr, nc));
                            }
                        }
                    }
                }
            }
        }
    }
    edges
}

/// Drop 8-connected edge components smaller than `min_size`. Removes the
/// compact edge rings stars leave behind, which would otherwise pollute the
/// Hough accumulator.
fn prune_small_components(edges: &Array2<bool>, min_size: usize) -> Array2<bool> {
    let (h, w) = edges.dim();
    let mut out = Array2::<bool>::from_elem((h, w), false);
    let mut visited = Array2::<bool>::from_elem((h, w), false);
    let mut component = Vec::new();
    let mut queue = VecDeque::new();

    for row in 0..h {
        for col in 0..w {
            if !edges[[row, col]] || visited[[row, col]] {
                continue;
            }
            component.clear();
            visited[[row, col]] = true;
            queue.push_back((row, col));
            while let Some((r, c)) = queue.pop_front() {
                component.push((r, c));
                for dr in -1isize..=1 {
                    for dc in -1isize..=1 {
                        let nr = r as isize + dr;
                        let nc = c as isize + dc;
                        if nr < 0 || nc < 0 || nr >= h as isize || nc >= w as isize {
                            continue;
                        }
                        let (nr, nc) = (nr as usize, nc as usize);
                        if edges[[nr, nc]] && !visited[[nr, nc]] {
                            visited[[nr, nc]] = true;
                            queue.push_back((nr, nc));
                        }
                    }
                }
            }
            if component.len() >= min_size {
                for &(r, c) in &component {
                    out[[r, c]] = true;
                }
            }
        }
    }
    out
}

/// Hough transform in (rho, theta) space, peak extraction with non-maximum
/// suppression, then segment extraction along each peak line with
/// `line_gap` merging and `line_len` acceptance.
fn hough_count_trails(
    edge_pixels: &[(usize, usize)],
    h: usize,
    w: usize,
    params: &TrailParams,
) -> usize {
    let theta_bins = 180 / HOUGH_THETA_STEP_DEG;
    let diag = ((h * h + w * w) as f64).sqrt().ceil() as isize;
    let rho_bins = (2 * diag + 1) as usize;

    let trig: Vec<(f64, f64)> = (0..theta_bins)
        .map(|t| {
            let theta = (t * HOUGH_THETA_STEP_DEG) as f64 * std::f64::consts::PI / 180.0;
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut accumulator = vec![0u32; theta_bins * rho_bins];
    for &(row, col) in edge_pixels {
        let (x, y) = (col as f64, row as f64);
        for (t, &(cos_t, sin_t)) in trig.iter().enumerate() {
            let rho = (x * cos_t + y * sin_t).round() as isize;
            let rho_idx = (rho + diag) as usize;
            accumulator[t * rho_bins + rho_idx] += 1;
        }
    }

    // Candidate peaks sorted by support, greedily NMS-filtered.
    let mut cells: Vec<(u32, usize, usize)> = accumulator
        .iter()
        .enumerate()
        .filter(|(_, &count)| count as usize >= params.line_len)
        .map(|(idx, &count)| (count, idx / rho_bins, idx % rho_bins))
        .collect();
    cells.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let mut peaks: Vec<(usize, usize)> = Vec::new();
    for &(_, t, r) in &cells {
        let suppressed = peaks.iter().any(|&(pt, pr)| {
            let dt = pt.abs_diff(t).min(theta_bins - pt.abs_diff(t));
            dt <= HOUGH_NMS_THETA && pr.abs_diff(r) <= HOUGH_NMS_RHO
        });
        if !suppressed {
            peaks.push((t, r));
        }
        if peaks.len() >= 32 {
            break;
        }
    }

    let mut num_trails = 0;
    for &(t, rho_idx) in &peaks {
        let (cos_t, sin_t) = trig[t];
        let rho = (rho_idx as isize - diag) as f64;

        // Positions of supporting pixels along the line direction.
        let mut along: Vec<f64> = edge_pixels
            .iter()
            .filter(|&&(row, col)| {
                let d = col as f64 * cos_t + row as f64 * sin_t - rho;
                d.abs() <= HOUGH_LINE_WIDTH
            })
            .map(|&(row, col)| -(col as f64) * sin_t + row as f64 * cos_t)
            .collect();
        along.sort_unstable_by(|a, b| a.total_cmp(b));

        // Split on gaps, keep segments long enough to be a trail.
        let mut start = match along.first() {
            Some(&v) => v,
            None => continue,
        };
        let mut prev = start;
        for &p in &along[1..] {
            if p - prev > params.line_gap as f64 {
                if prev - start >= params.line_len as f64 {
                    num_trails += 1;
                }
                start = p;
            }
            prev = p;
        }
        if prev - start >= params.line_len as f64 {
            num_trails += 1;
        }
    }

    num_trails
}
