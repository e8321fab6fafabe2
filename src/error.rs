use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pairmark operations.
///
/// Every variant is recoverable: callers report the failure and keep the
/// session alive with its prior state.
#[derive(Debug, Error)]
pub enum PairmarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("at least two images are required, found {count}")]
    TooFewImages { count: usize },

    #[error("Failed to parse images.txt from {path}: {message}")]
    ImagesTxtParse { path: PathBuf, message: String },

    #[error("Failed to write images.txt to {path}: {source}")]
    ImagesTxtWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zoom {requested} is outside the accepted range [{min}, {max}]")]
    ZoomOutOfRange { requested: f64, min: f64, max: f64 },

    #[error("({x}, {y}) lies outside the bounds of '{image}' ({width}x{height})")]
    CoordinateOutOfBounds {
        image: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    #[error("no descriptor could be computed at ({x:.2}, {y:.2}) on '{image}'")]
    DescriptorUnavailable { image: String, x: f64, y: f64 },

    #[error("could not read image '{image}': {message}")]
    ImageUnreadable { image: String, message: String },
}
