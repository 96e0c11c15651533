/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Sigma multiplier for iterative clipping in background estimation.
pub const CLIP_SIGMA: f64 = 3.0;

/// Iteration cap for sigma-clipping. Convergence is usually reached in 2-3.
pub const CLIP_MAX_ITERS: usize = 5;

/// FWHM of a Gaussian in units of its standard deviation: 2*sqrt(2*ln(2)).
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045;

/// Default expected star FWHM (pixels) for the matched detection kernel.
pub const DEFAULT_FWHM_GUESS: f64 = 3.5;

/// Default detection threshold in units of the background noise.
pub const DEFAULT_THRESHOLD_SIGMA: f64 = 5.0;

/// Detection kernel truncation radius in units of the kernel sigma.
pub const KERNEL_SIGMA_RADIUS: f64 = 1.5;

/// Default sharpness bounds. Below: extended blobs; above: single hot pixels.
pub const DEFAULT_SHARPLO: f64 = 0.2;
pub const DEFAULT_SHARPHI: f64 = 1.0;

/// Default absolute roundness bound for both roundness statistics.
pub const DEFAULT_ROUNDHI: f64 = 0.6;

/// Half-size of the square cutout used for PSF moment measurement.
pub const PSF_BOX_RADIUS: usize = 4;

/// Signal cut for the SNR estimate, in units of noise above background.
pub const SIGNAL_CUT_SIGMA: f64 = 2.0;

/// Trail detector defaults: blur sigma, hysteresis thresholds (in units of
/// the robust gradient spread), minimum line support (pixels), minimum edge
/// component size, and collinear gap tolerance.
pub const DEFAULT_TRAIL_SIGMA: f64 = 2.0;
pub const DEFAULT_TRAIL_LOW_THR: f64 = 2.0;
pub const DEFAULT_TRAIL_HIGH_THR: f64 = 5.0;
pub const DEFAULT_TRAIL_LINE_LEN: usize = 100;
pub const DEFAULT_TRAIL_SMALL_EDGE: usize = 10;
pub const DEFAULT_TRAIL_LINE_GAP: usize = 20;

/// Hough accumulator angular resolution (degrees per bin).
pub const HOUGH_THETA_STEP_DEG: usize = 1;

/// Non-maximum suppression window around a Hough peak: +/- bins in theta
/// and +/- pixels in rho. Wide enough to merge the two parallel edges of a
/// blurred streak into a single line.
pub const HOUGH_NMS_THETA: usize = 5;
pub const HOUGH_NMS_RHO: usize = 6;

/// Maximum perpendicular distance (pixels) for an edge pixel to support a
/// Hough line when extracting segments.
pub const HOUGH_LINE_WIDTH: f64 = 1.5;
