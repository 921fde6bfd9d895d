use thiserror::Error;

use crate::kernels::KernelKind;

#[derive(Error, Debug)]
pub enum HarrisError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },

    #[error("Image must have at least one channel")]
    NoChannels,

    #[error("Image {width}x{height} too small (minimum {min_width}x{min_height} for the kernels in use)")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },

    #[error("Smoothing kernel {0:?} is not a Gaussian")]
    InvalidSmoothingKernel(KernelKind),

    #[error("Harris sensitivity {0} is not a finite number")]
    InvalidKappa(f64),

    #[error("Gradient kernels differ in shape: {x_rows}x{x_cols} vs {y_rows}x{y_cols}")]
    GradientKernelMismatch {
        x_rows: usize,
        x_cols: usize,
        y_rows: usize,
        y_cols: usize,
    },

    #[error("Display canvas {display_width}x{display_height} smaller than response buffer {response_width}x{response_height}")]
    DisplayTooSmall {
        display_width: usize,
        display_height: usize,
        response_width: usize,
        response_height: usize,
    },

    #[error("Frame shape mismatch: expected {expected_width}x{expected_height}x{expected_channels}, got {width}x{height}x{channels}")]
    FrameMismatch {
        expected_width: usize,
        expected_height: usize,
        expected_channels: usize,
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("No frame in progress; call begin() first")]
    NoFrameInProgress,

    #[cfg(feature = "serde")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "serde")]
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[cfg(feature = "serde")]
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

pub type HarrisResult<T> = Result<T, HarrisError>;
