use thiserror::Error;

/// A malformed model container.
///
/// Every variant carries the byte offset of the section that failed so load
/// failures can be reported against the file.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("section offset {offset} is not 4-byte aligned")]
    Misaligned { offset: usize },

    #[error("unknown section type {tag} at offset {offset}")]
    UnknownSection { tag: u32, offset: usize },

    #[error("section at offset {offset} needs {needed} bytes but only {available} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("embedded image at offset {offset} could not be decoded")]
    Image {
        offset: usize,
        #[source]
        source: image::ImageError,
    },
}

impl FormatError {
    /// Byte offset of the offending section.
    pub fn offset(&self) -> usize {
        match self {
            Self::Misaligned { offset }
            | Self::UnknownSection { offset, .. }
            | Self::Truncated { offset, .. }
            | Self::Image { offset, .. } => *offset,
        }
    }
}
