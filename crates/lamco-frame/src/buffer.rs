//! Frame buffers and borrowed frame views
//!
//! [`FrameView`] is the borrowed descriptor a capture callback receives: the
//! bytes belong to the producer and are only valid for the duration of the
//! call. [`FrameBuffer`] is the owned counterpart. A frame buffer's
//! dimensions and format are fixed at construction; converting or cloning
//! always yields a new buffer.
//!
//! # Ownership
//!
//! ```text
//! capture thread                         consumer
//! ──────────────                         ────────
//! FrameView<'cb>  ──clone_frame()──▶  FrameBuffer (new owner)
//!       │
//!       └────────convert_to_8bit()──▶  FrameBuffer (new owner, narrower format)
//! ```

use std::borrow::Cow;

use crate::clone::clone_frame;
use crate::convert::convert_to_8bit;
use crate::error::{try_alloc, FrameError, Result};
use crate::format::PixelFormat;
use crate::palette::Palette;

/// Borrowed view of a frame
///
/// Field values are taken as declared by the producer. Every operation that
/// consumes a view checks the layout first via [`FrameView::validate`].
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes from the start of one row to the start of the next
    pub stride: usize,
    /// Pixel format
    pub format: PixelFormat,
    /// Pixel bytes, `stride * height` long
    pub data: &'a [u8],
    /// Palette for palette formats
    pub palette: Option<&'a Palette>,
}

impl<'a> FrameView<'a> {
    /// Describe a frame without a palette
    pub fn new(width: u32, height: u32, stride: usize, format: PixelFormat, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            stride,
            format,
            data,
            palette: None,
        }
    }

    /// Describe a frame from the raw callback arguments
    ///
    /// Mirrors `onFrame(width, height, strideBytes, pixelFormatTag, byteBuffer)`.
    /// Only the tag is checked here; layout is checked by the operation that
    /// consumes the view.
    pub fn from_raw_parts(width: u32, height: u32, stride: usize, format_tag: u32, data: &'a [u8]) -> Result<Self> {
        let format = PixelFormat::from_tag(format_tag)?;
        Ok(Self::new(width, height, stride, format, data))
    }

    /// Attach a palette
    #[must_use]
    pub fn with_palette(mut self, palette: &'a Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Bytes holding the pixels of one row, excluding padding
    pub fn row_bytes(&self) -> usize {
        self.format.min_row_bytes(self.width)
    }

    /// Check that the declared layout matches the byte buffer
    ///
    /// # Errors
    ///
    /// - [`FrameError::InvalidDimensions`] if width or height is zero
    /// - [`FrameError::MalformedBuffer`] if the stride is shorter than a row
    ///   or the buffer length differs from `stride * height`
    /// - [`FrameError::InvalidPalette`] if the palette is missing, unexpected,
    ///   or of the wrong length
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let row_bytes = self.row_bytes();
        if self.stride < row_bytes {
            return Err(FrameError::malformed(format!(
                "stride {} is shorter than a {} row of {} pixels ({} bytes)",
                self.stride, self.format, self.width, row_bytes
            )));
        }

        let expected = expected_len(self.stride, self.height)?;
        if self.data.len() != expected {
            return Err(FrameError::malformed(format!(
                "buffer holds {} bytes, {}x{} {} with stride {} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.format,
                self.stride,
                expected
            )));
        }

        match (self.format.palette_len(), self.palette) {
            (Some(len), Some(palette)) if palette.len() != len => Err(FrameError::invalid_palette(format!(
                "{} needs {} entries, got {}",
                self.format,
                len,
                palette.len()
            ))),
            (Some(_), None) if self.format.is_indexed() => {
                Err(FrameError::invalid_palette(format!("{} frame has no palette", self.format)))
            }
            (None, Some(_)) => Err(FrameError::invalid_palette(format!(
                "{} frames do not carry a palette",
                self.format
            ))),
            _ => Ok(()),
        }
    }

    /// Palette the frame resolves to
    ///
    /// Gray8 frames without an explicit palette use the grayscale palette.
    pub fn resolved_palette(&self) -> Option<Cow<'a, Palette>> {
        match (self.palette, self.format) {
            (Some(palette), _) => Some(Cow::Borrowed(palette)),
            (None, PixelFormat::Gray8) => Some(Cow::Owned(Palette::grayscale())),
            (None, _) => None,
        }
    }

    /// Pixel bytes of row `y`, padding excluded
    ///
    /// Returns an empty slice when the row lies outside the buffer.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        row_range(y, self.stride, self.row_bytes())
            .and_then(|range| data.get(range))
            .unwrap_or_default()
    }

    /// Pixel bytes of every row, top to bottom, padding excluded
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &'a [u8]> {
        let view = *self;
        (0..self.height).map(move |y| view.row(y))
    }
}

/// Owned frame buffer
///
/// Invariants, checked by every constructor:
/// - `data.len() == stride * height`
/// - `stride >= format.min_row_bytes(width)`
/// - a palette is present iff `format.has_palette()`, with `2^bpp` entries
///
/// There is no `Clone` impl; copies go through [`FrameBuffer::deep_clone`],
/// which reports allocation failure.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    palette: Option<Palette>,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Take ownership of pixel bytes
    ///
    /// Gray8 frames given no palette receive the grayscale palette.
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
        palette: Option<Palette>,
    ) -> Result<Self> {
        let palette = match (palette, format) {
            (None, PixelFormat::Gray8) => Some(Palette::grayscale()),
            (palette, _) => palette,
        };

        let view = FrameView {
            width,
            height,
            stride,
            format,
            data: &data,
            palette: palette.as_ref(),
        };
        view.validate()?;

        Ok(Self {
            width,
            height,
            stride,
            format,
            palette,
            data,
        })
    }

    /// Allocate a zero-filled frame with an aligned stride
    pub fn zeroed(width: u32, height: u32, format: PixelFormat, palette: Option<Palette>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let stride = format.aligned_stride(width);
        let data = try_alloc(alloc_len(stride, height)?)?;
        Self::new(width, height, stride, format, data, palette)
    }

    /// Assemble a frame whose layout the caller has already established
    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
        palette: Option<Palette>,
    ) -> Self {
        debug_assert_eq!(data.len(), stride * height as usize);
        debug_assert_eq!(palette.is_some(), format.has_palette());
        Self {
            width,
            height,
            stride,
            format,
            palette,
            data,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Stride in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Palette, present for palette formats
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// All bytes including row padding
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the bytes; dimensions and format stay fixed
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Release the byte buffer
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel bytes of row `y`, padding excluded
    pub fn row(&self, y: u32) -> &[u8] {
        self.view().row(y)
    }

    /// Mutable pixel bytes of row `y`, padding excluded
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let row_bytes = self.format.min_row_bytes(self.width);
        row_range(y, self.stride, row_bytes)
            .and_then(|range| self.data.get_mut(range))
            .unwrap_or_default()
    }

    /// Borrow as a view
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
            data: &self.data,
            palette: self.palette.as_ref(),
        }
    }

    /// Independent deep copy, see [`clone_frame`]
    pub fn deep_clone(&self) -> Result<Self> {
        clone_frame(&self.view())
    }

    /// 8-bit-per-channel copy, see [`convert_to_8bit`]
    pub fn convert_to_8bit(&self) -> Result<Self> {
        convert_to_8bit(&self.view())
    }
}

impl<'a> From<&'a FrameBuffer> for FrameView<'a> {
    fn from(frame: &'a FrameBuffer) -> Self {
        frame.view()
    }
}

fn row_range(y: u32, stride: usize, row_bytes: usize) -> Option<std::ops::Range<usize>> {
    let start = (y as usize).checked_mul(stride)?;
    Some(start..start.checked_add(row_bytes)?)
}

/// `stride * height` for validation, overflow means the descriptor is bogus
fn expected_len(stride: usize, height: u32) -> Result<usize> {
    stride
        .checked_mul(height as usize)
        .ok_or_else(|| FrameError::malformed(format!("stride {stride} x height {height} overflows")))
}

/// `stride * height` for allocation, overflow means the allocation cannot succeed
pub(crate) fn alloc_len(stride: usize, height: u32) -> Result<usize> {
    stride
        .checked_mul(height as usize)
        .ok_or(FrameError::OutOfMemory { requested: usize::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteEntry;

    fn padded_rgb24() -> Vec<u8> {
        // 2x2 Rgb24, stride 8 (6 pixel bytes + 2 padding)
        vec![
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12, 0xEE, 0xEE,
        ]
    }

    #[test]
    fn test_view_rows_skip_padding() {
        let data = padded_rgb24();
        let view = FrameView::new(2, 2, 8, PixelFormat::Rgb24, &data);
        view.validate().expect("valid layout");

        let rows: Vec<&[u8]> = view.rows().collect();
        assert_eq!(rows, vec![&[1, 2, 3, 4, 5, 6][..], &[7, 8, 9, 10, 11, 12][..]]);
        assert_eq!(view.rows().rev().next(), Some(&[7, 8, 9, 10, 11, 12][..]));
        assert!(view.row(2).is_empty());
    }

    #[test]
    fn test_validate_length_mismatch() {
        let data = vec![0u8; 15];
        let view = FrameView::new(2, 2, 8, PixelFormat::Rgb24, &data);
        assert!(matches!(view.validate(), Err(FrameError::MalformedBuffer(_))));
    }

    #[test]
    fn test_validate_short_stride() {
        let data = vec![0u8; 10];
        let view = FrameView::new(2, 2, 5, PixelFormat::Rgb24, &data);
        assert!(matches!(view.validate(), Err(FrameError::MalformedBuffer(_))));
    }

    #[test]
    fn test_validate_zero_dimensions() {
        let view = FrameView::new(0, 2, 0, PixelFormat::Rgb24, &[]);
        assert_eq!(
            view.validate(),
            Err(FrameError::InvalidDimensions { width: 0, height: 2 })
        );
    }

    #[test]
    fn test_validate_overflowing_stride() {
        let view = FrameView::new(1, 3, usize::MAX, PixelFormat::Gray8, &[]);
        assert!(matches!(view.validate(), Err(FrameError::MalformedBuffer(_))));
    }

    #[test]
    fn test_validate_palette_rules() {
        let data = vec![0u8; 4];
        let gray = Palette::grayscale();
        let short = Palette::gray_ramp(16);

        let indexed = FrameView::new(4, 1, 4, PixelFormat::Indexed8, &data);
        assert!(matches!(indexed.validate(), Err(FrameError::InvalidPalette(_))));
        assert!(indexed.with_palette(&gray).validate().is_ok());
        assert!(matches!(
            indexed.with_palette(&short).validate(),
            Err(FrameError::InvalidPalette(_))
        ));

        // Gray8 falls back to the grayscale palette
        let gray8 = FrameView::new(4, 1, 4, PixelFormat::Gray8, &data);
        assert!(gray8.validate().is_ok());
        assert!(gray8.resolved_palette().expect("gray palette").is_grayscale());

        let rgb = FrameView::new(1, 1, 4, PixelFormat::Argb32, &data);
        assert!(matches!(
            rgb.with_palette(&gray).validate(),
            Err(FrameError::InvalidPalette(_))
        ));
    }

    #[test]
    fn test_from_raw_parts() {
        let data = padded_rgb24();
        let view = FrameView::from_raw_parts(2, 2, 8, 0x0002_1808, &data).expect("known tag");
        assert_eq!(view.format, PixelFormat::Rgb24);

        let err = FrameView::from_raw_parts(2, 2, 8, 7, &data).expect_err("unknown tag");
        assert!(matches!(err, FrameError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_frame_buffer_new_validates() {
        let frame = FrameBuffer::new(2, 2, 8, PixelFormat::Rgb24, padded_rgb24(), None).expect("valid frame");
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.stride(), 8);
        assert_eq!(frame.row(1), &[7, 8, 9, 10, 11, 12]);
        assert!(frame.palette().is_none());

        let err = FrameBuffer::new(2, 2, 8, PixelFormat::Rgb24, vec![0; 3], None).expect_err("short buffer");
        assert!(matches!(err, FrameError::MalformedBuffer(_)));
    }

    #[test]
    fn test_gray8_gets_grayscale_palette() {
        let frame = FrameBuffer::new(4, 1, 4, PixelFormat::Gray8, vec![0, 64, 128, 255], None).expect("gray8");
        assert!(frame.palette().expect("palette").is_grayscale());
    }

    #[test]
    fn test_zeroed() {
        let frame = FrameBuffer::zeroed(3, 2, PixelFormat::Rgb24, None).expect("zeroed");
        assert_eq!(frame.stride(), 12);
        assert_eq!(frame.data().len(), 24);

        let palette = Palette::new(vec![PaletteEntry::rgb(0, 0, 0), PaletteEntry::rgb(255, 0, 0)]);
        let mono = FrameBuffer::zeroed(10, 1, PixelFormat::Indexed1, Some(palette)).expect("indexed1");
        assert_eq!(mono.stride(), 4);

        let err = FrameBuffer::zeroed(10, 1, PixelFormat::Indexed1, None).expect_err("missing palette");
        assert!(matches!(err, FrameError::InvalidPalette(_)));
    }

    #[test]
    fn test_row_mut_leaves_padding() {
        let mut frame = FrameBuffer::new(2, 2, 8, PixelFormat::Rgb24, padded_rgb24(), None).expect("frame");
        frame.row_mut(0).fill(0);
        assert_eq!(&frame.data()[..8], &[0, 0, 0, 0, 0, 0, 0xEE, 0xEE]);
    }
}
