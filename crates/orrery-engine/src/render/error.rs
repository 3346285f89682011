use std::path::PathBuf;

use orrery_asset::FormatError;
use thiserror::Error;

/// Errors raised by the render core.
///
/// `Device` and `UnsupportedPlatform` are fatal. `Format`, `Io` and
/// `ExceedsLimits` are local to one model load; the model is logged and dropped.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("graphics device error: {0}")]
    Device(String),

    #[error("platform has no usable graphics device: {0}")]
    UnsupportedPlatform(String),

    /// Checked before anything is allocated, so the device is untouched.
    #[error("model exceeds device limits: {0}")]
    ExceedsLimits(String),

    #[error("malformed model container")]
    Format(#[from] FormatError),

    #[error("failed to read model file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Whether rendering can continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Device(_) | Self::UnsupportedPlatform(_))
    }
}
