//! Error types for frame operations
//!
//! Conversion and cloning fail fast: when an operation returns an error no
//! destination buffer is handed back, partially written or otherwise.

use thiserror::Error;

/// Errors that can occur while building, converting or cloning frames
///
/// # Examples
///
/// ```
/// use lamco_frame::{convert_to_8bit, FrameError, FrameView, PixelFormat};
///
/// let pixels = [0u8; 12];
/// let view = FrameView::new(4, 1, 12, PixelFormat::Rgb24, &pixels);
///
/// match convert_to_8bit(&view) {
///     Err(FrameError::UnsupportedFormat(reason)) => println!("nothing to narrow: {reason}"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The operation has no defined mapping for this pixel format
    ///
    /// Caller error. Retrying with the same input fails the same way.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    /// Declared stride or dimensions are inconsistent with the byte buffer
    ///
    /// Indicates upstream corruption of the frame descriptor.
    #[error("Malformed frame buffer: {0}")]
    MalformedBuffer(String),

    /// Allocating the destination buffer failed
    #[error("Out of memory allocating {requested} bytes")]
    OutOfMemory {
        /// Number of bytes the allocation asked for
        requested: usize,
    },

    /// Palette missing, unexpected, or of the wrong length for the format
    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    /// Width or height is zero
    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Frame width in pixels
        width: u32,
        /// Frame height in pixels
        height: u32,
    },
}

/// Result type for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;

impl FrameError {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBuffer(msg.into())
    }

    pub(crate) fn invalid_palette(msg: impl Into<String>) -> Self {
        Self::InvalidPalette(msg.into())
    }

    /// Whether the error is caused by the caller's input rather than the environment
    ///
    /// `OutOfMemory` is the only error that may succeed on a later attempt.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::OutOfMemory { .. })
    }
}

/// Allocate a zero-filled byte buffer, surfacing allocation failure
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| FrameError::OutOfMemory { requested: len })?;
    buf.resize(len, 0);
    Ok(buf)
}
