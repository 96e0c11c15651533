use ndarray::Array2;

use crate::consts::SIGNAL_CUT_SIGMA;

/// Per-image signal-to-noise estimate.
///
/// Fixed contract (round-trip tested, see DESIGN.md): signal pixels are the
/// finite pixels above `background + SIGNAL_CUT_SIGMA * noise`, and
/// `snr = mean(signal - background) / noise` over that set. Deterministic
/// for identical input, monotonic in added signal.
#[derive(Clone, Copy, Debug)]
pub struct SnrEstimate {
    /// NaN when noise is unusable or no pixel clears the signal cut.
    pub snr: f64,
    pub signal_pixels: u64,
}

pub fn estimate(data: &Array2<f32>, background: f64, noise: f64) -> SnrEstimate {
    if !background.is_finite() || !noise.is_finite() || noise <= 0.0 {
        return SnrEstimate {
            snr: f64::NAN,
            signal_pixels: 0,
        };
    }

    let cut = background + SIGNAL_CUT_SIGMA * noise;
    let mut excess_sum = 0.0;
    let mut count = 0u64;
    for &v in data.iter() {
        let v = v as f64;
        if v.is_finite() && v > cut {
            excess_sum += v - background;
            count += 1;
        }
    }

    if count == 0 {
        return SnrEstimate {
            snr: f64::NAN,
            signal_pixels: 0,
        };
    }

    SnrEstimate {
        snr: (excess_sum / count as f64) / noise,
        signal_pixels: count,
    }
}
