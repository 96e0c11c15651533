use std::path::PathBuf;

use ndarray::Array2;

/// A single grayscale exposure.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8 or 16)
    pub original_bit_depth: u8,
    /// Header-derived metadata, when the source format carries any.
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
            metadata: FrameMetadata::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Provenance fields consumed by stacking-plan tooling downstream.
/// All optional: plain raster formats carry none of them.
#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub source: Option<PathBuf>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub exposure: Option<f64>,
    pub filter: Option<String>,
    pub temperature: Option<f64>,
    pub date_obs: Option<String>,
    pub telescope: Option<String>,
}
