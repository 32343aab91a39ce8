//! 16-bit to 8-bit Pixel Conversion
//!
//! Narrows frames with 16-bit channels to 8-bit channels for display and
//! encoder paths that cannot consume the higher bit depth.
//!
//! # Mapping
//!
//! | Source | Output |
//! |--------|--------|
//! | Gray16 | Gray8 (+ 256-entry grayscale palette) |
//! | Rgb48 | Rgb24 |
//! | Argb64 | Argb32 |
//! | PArgb64 | PArgb32 |
//!
//! Each sample keeps only its high byte: `s >> 8`, truncating. No rounding is
//! applied, so output matches earlier capture tooling bit for bit.
//!
//! # Examples
//!
//! ```
//! use lamco_frame::{convert_to_8bit, FrameView, PixelFormat};
//!
//! // 2x1 Rgb48, every sample 0x8040 (little-endian)
//! let pixels = [0x40, 0x80].repeat(6);
//! let view = FrameView::new(2, 1, 12, PixelFormat::Rgb48, &pixels);
//!
//! let rgb24 = convert_to_8bit(&view)?;
//! assert_eq!(rgb24.format(), PixelFormat::Rgb24);
//! assert_eq!(rgb24.row(0), &[0x80; 6]);
//! # Ok::<(), lamco_frame::FrameError>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::buffer::{alloc_len, FrameBuffer, FrameView};
use crate::error::{try_alloc, FrameError, Result};
use crate::format::PixelFormat;
use crate::palette::Palette;

/// Convert a 16-bit-per-channel frame to 8 bits per channel
///
/// The source is only read. Output has the same width and height, channel
/// count and channel order; its stride is recomputed for the new format.
///
/// # Errors
///
/// - [`FrameError::UnsupportedFormat`] if the source format has no 8-bit mapping
/// - [`FrameError::MalformedBuffer`] / [`FrameError::InvalidDimensions`] if the
///   declared layout does not match the buffer
/// - [`FrameError::OutOfMemory`] if the output cannot be allocated
pub fn convert_to_8bit(source: &FrameView<'_>) -> Result<FrameBuffer> {
    let target = source
        .format
        .to_8bit()
        .ok_or_else(|| FrameError::unsupported(format!("{} has no 8-bit form", source.format)))?;
    source.validate()?;

    let samples_per_row = source.width as usize * source.format.channels();
    let stride = target.aligned_stride(source.width);
    let mut data = try_alloc(alloc_len(stride, source.height)?)?;

    for (src_row, dst_row) in source.rows().zip(data.chunks_exact_mut(stride)) {
        narrow_row(src_row, &mut dst_row[..samples_per_row]);
    }

    let palette = (target == PixelFormat::Gray8).then(Palette::grayscale);

    trace!(
        "Converted {}x{} {} to {}",
        source.width,
        source.height,
        source.format,
        target
    );

    Ok(FrameBuffer::from_parts(
        source.width,
        source.height,
        stride,
        target,
        data,
        palette,
    ))
}

/// High byte of a 16-bit sample
#[inline]
pub const fn narrow_sample(sample: u16) -> u8 {
    (sample >> 8) as u8
}

/// Narrow one row of little-endian 16-bit samples
#[inline]
fn narrow_row(src: &[u8], dst: &mut [u8]) {
    for (sample, out) in src.chunks_exact(2).zip(dst.iter_mut()) {
        *out = narrow_sample(u16::from_le_bytes([sample[0], sample[1]]));
    }
}

/// Format converter with conversion counters
///
/// Holds no per-frame state, so one converter can be shared between threads.
#[derive(Debug, Default)]
pub struct FormatConverter {
    frames_converted: AtomicU64,
    bytes_written: AtomicU64,
}

impl FormatConverter {
    /// Create a converter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a frame, see [`convert_to_8bit`]
    pub fn convert(&self, source: &FrameView<'_>) -> Result<FrameBuffer> {
        let frame = convert_to_8bit(source)?;
        self.frames_converted.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(frame.data().len() as u64, Ordering::Relaxed);
        Ok(frame)
    }

    /// Check if format needs narrowing
    #[must_use]
    pub fn needs_conversion(format: PixelFormat) -> bool {
        format.is_16bit_per_channel()
    }

    /// Size in bytes of the converted frame, `None` if the format has no 8-bit form
    #[must_use]
    pub fn output_size(width: u32, height: u32, format: PixelFormat) -> Option<usize> {
        let target = format.to_8bit()?;
        target.aligned_stride(width).checked_mul(height as usize)
    }

    /// Frames converted so far
    pub fn frames_converted(&self) -> u64 {
        self.frames_converted.load(Ordering::Relaxed)
    }

    /// Output bytes produced so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}
