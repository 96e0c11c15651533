#![allow(dead_code)]

use ndarray::Array2;

use lightcull_core::model::{ResultRow, Status};

/// Uniform image at `level`.
pub fn flat_image(height: usize, width: usize, level: f32) -> Array2<f32> {
    Array2::from_elem((height, width), level)
}

/// Add a circular Gaussian star centered at (row, col).
pub fn add_gaussian_star(img: &mut Array2<f32>, row: f64, col: f64, sigma: f64, amplitude: f32) {
    add_elliptical_star(img, row, col, sigma, sigma, amplitude);
}

/// Add an elliptical Gaussian, axis-aligned, sigma per axis.
pub fn add_elliptical_star(
    img: &mut Array2<f32>,
    row: f64,
    col: f64,
    sigma_y: f64,
    sigma_x: f64,
    amplitude: f32,
) {
    let (h, w) = img.dim();
    let reach = (4.0 * sigma_x.max(sigma_y)).ceil() as isize;
    let r0 = row.round() as isize;
    let c0 = col.round() as isize;
    for r in (r0 - reach).max(0)..((r0 + reach + 1).min(h as isize)) {
        for c in (c0 - reach).max(0)..((c0 + reach + 1).min(w as isize)) {
            let dy = r as f64 - row;
            let dx = c as f64 - col;
            let g = (-(dy * dy) / (2.0 * sigma_y * sigma_y) - (dx * dx) / (2.0 * sigma_x * sigma_x))
                .exp();
            img[[r as usize, c as usize]] += amplitude * g as f32;
        }
    }
}

/// Add a 2-pixel-wide diagonal streak across the whole image.
pub fn add_diagonal_streak(img: &mut Array2<f32>, amplitude: f32) {
    let (h, w) = img.dim();
    let n = h.min(w);
    for i in 0..n {
        img[[i, i]] += amplitude;
        if i + 1 < n {
            img[[i, i + 1]] += amplitude;
        }
    }
}

/// Deterministic uniform noise in [-amplitude, amplitude] from a seeded LCG.
pub fn add_noise(img: &mut Array2<f32>, amplitude: f32, seed: u64) {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    for v in img.iter_mut() {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
        *v += amplitude * (2.0 * unit as f32 - 1.0);
    }
}

/// An ok result row with the given SNR, named `frame_<n>.png`.
pub fn row_with_snr(n: usize, snr: f64) -> ResultRow {
    let name = format!("frame_{n:03}.png");
    let mut row = ResultRow::pending(name.clone(), format!("/lights/{name}"), name);
    row.snr = Some(snr);
    row
}

/// An error row, metrics empty by construction.
pub fn error_row(n: usize) -> ResultRow {
    let name = format!("frame_{n:03}.png");
    let mut row = ResultRow::failed(
        name.clone(),
        format!("/lights/{name}"),
        name,
        "decode failed".to_string(),
    );
    assert_eq!(row.status, Status::Error);
    row.snr = None;
    row
}
