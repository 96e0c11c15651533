use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CullError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Cannot read input directory {path}: {message}")]
    InputDir { path: PathBuf, message: String },

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Report error: {0}")]
    Report(String),

    #[error("Serialized result block is invalid: {0}")]
    ResultBlock(#[from] serde_json::Error),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, CullError>;
