//! Deep frame copies
//!
//! A capture callback's frame bytes are reused by the producer on the next
//! tick. Anything that must outlive the callback is copied here into a new,
//! independently owned [`FrameBuffer`].
//!
//! Copies walk the source row by row using its declared stride, so row
//! padding in the source is never assumed to be absent. The destination gets
//! its own aligned stride with zeroed padding.

use tracing::trace;

use crate::buffer::{alloc_len, FrameBuffer, FrameView};
use crate::error::{try_alloc, Result};
use crate::palette::Palette;

/// Row order of the copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOrder {
    /// Keep rows in place
    Same,
    /// Last source row becomes the first destination row
    Reversed,
}

/// Deep-copy a frame, pixels and palette
///
/// The destination shares no memory with the source. Per-row pixel bytes
/// match exactly; the destination stride may differ from the source stride.
///
/// # Errors
///
/// - [`FrameError::MalformedBuffer`](crate::FrameError::MalformedBuffer),
///   [`FrameError::InvalidDimensions`](crate::FrameError::InvalidDimensions) or
///   [`FrameError::InvalidPalette`](crate::FrameError::InvalidPalette) if the
///   source layout is inconsistent
/// - [`FrameError::OutOfMemory`](crate::FrameError::OutOfMemory) if the copy
///   cannot be allocated
///
/// # Examples
///
/// ```
/// use lamco_frame::{clone_frame, FrameView, PixelFormat};
///
/// // 1x2 Gray8 with two bytes of padding per row
/// let captured = [10u8, 0xEE, 0xEE, 0xEE, 20, 0xEE, 0xEE, 0xEE];
/// let view = FrameView::new(1, 2, 4, PixelFormat::Gray8, &captured);
///
/// let owned = clone_frame(&view)?;
/// assert_eq!(owned.row(0), &[10]);
/// assert_eq!(owned.row(1), &[20]);
/// # Ok::<(), lamco_frame::FrameError>(())
/// ```
pub fn clone_frame(source: &FrameView<'_>) -> Result<FrameBuffer> {
    copy_rows(source, RowOrder::Same)
}

/// Deep-copy a frame with its rows in reverse order
///
/// Turns a bottom-up buffer (the usual layout of DIB sample buffers handed
/// out by sample grabbers) into a top-down frame, or the other way round.
pub fn flip_vertical(source: &FrameView<'_>) -> Result<FrameBuffer> {
    copy_rows(source, RowOrder::Reversed)
}

fn copy_rows(source: &FrameView<'_>, order: RowOrder) -> Result<FrameBuffer> {
    source.validate()?;

    let row_bytes = source.row_bytes();
    let stride = source.format.aligned_stride(source.width);
    let mut data = try_alloc(alloc_len(stride, source.height)?)?;

    let palette = match source.resolved_palette() {
        Some(palette) => Some(Palette::try_copy(&palette)?),
        None => None,
    };

    let dst_rows = data.chunks_exact_mut(stride);
    match order {
        RowOrder::Same => {
            for (src_row, dst_row) in source.rows().zip(dst_rows) {
                dst_row[..row_bytes].copy_from_slice(src_row);
            }
        }
        RowOrder::Reversed => {
            for (src_row, dst_row) in source.rows().rev().zip(dst_rows) {
                dst_row[..row_bytes].copy_from_slice(src_row);
            }
        }
    }

    trace!(
        "Copied {}x{} {} frame (stride {} -> {}, {:?})",
        source.width,
        source.height,
        source.format,
        source.stride,
        stride,
        order
    );

    Ok(FrameBuffer::from_parts(
        source.width,
        source.height,
        stride,
        source.format,
        data,
        palette,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameError;
    use crate::format::PixelFormat;
    use crate::palette::PaletteEntry;

    /// 3x2 Rgb24 at stride 12 (9 pixel bytes + 3 padding)
    fn padded_rgb24() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 0xAA, 0xBB, 0xCC]);
        data.extend_from_slice(&[11, 12, 13, 14, 15, 16, 17, 18, 19, 0xDD, 0xEE, 0xFF]);
        data
    }

    #[test]
    fn test_clone_honors_source_stride() {
        // Stride 16 where 12 would do
        let mut data = vec![0x55u8; 16 * 2];
        data[..9].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        data[16..25].copy_from_slice(&[11, 12, 13, 14, 15, 16, 17, 18, 19]);

        let view = FrameView::new(3, 2, 16, PixelFormat::Rgb24, &data);
        let copy = clone_frame(&view).expect("clone");

        assert_eq!(copy.stride(), 12);
        assert_eq!(copy.row(0), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(copy.row(1), &[11, 12, 13, 14, 15, 16, 17, 18, 19]);
        // Destination padding is zeroed, not copied
        assert_eq!(&copy.data()[9..12], &[0, 0, 0]);
    }

    #[test]
    fn test_clone_is_idempotent() {
        let data = padded_rgb24();
        let view = FrameView::new(3, 2, 12, PixelFormat::Rgb24, &data);

        let once = clone_frame(&view).expect("first clone");
        let twice = once.deep_clone().expect("second clone");
        assert_eq!(once, twice);
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut data = padded_rgb24();
        let copy = {
            let view = FrameView::new(3, 2, 12, PixelFormat::Rgb24, &data);
            clone_frame(&view).expect("clone")
        };

        // Producer reuses its buffer for the next frame
        data.fill(0);
        assert_eq!(copy.row(0), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);

        let mut second = copy.deep_clone().expect("clone");
        second.row_mut(0).fill(0x77);
        assert_eq!(copy.row(0), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_clone_indexed8_palette() {
        let entries: Vec<PaletteEntry> = (0..=255u8)
            .map(|i| PaletteEntry::argb(i, 255 - i, i / 2, i.wrapping_mul(3)))
            .collect();
        let palette = Palette::new(entries.clone());
        let data = vec![0u8, 1, 254, 255];

        let view = FrameView::new(4, 1, 4, PixelFormat::Indexed8, &data).with_palette(&palette);
        let copy = clone_frame(&view).expect("clone indexed8");

        let copied = copy.palette().expect("palette copied");
        assert_eq!(copied.len(), 256);
        assert_eq!(copied.entries(), entries.as_slice());
        assert_eq!(copy.row(0), &[0, 1, 254, 255]);
    }

    #[test]
    fn test_clone_sub_byte_formats() {
        let palette = Palette::gray_ramp(16);
        // 5 Indexed4 pixels use 3 bytes per row
        let data = vec![0x01, 0x23, 0x40, 0x00, 0x56, 0x78, 0x90, 0x00];
        let view = FrameView::new(5, 2, 4, PixelFormat::Indexed4, &data).with_palette(&palette);

        let copy = clone_frame(&view).expect("clone indexed4");
        assert_eq!(copy.row(0), &[0x01, 0x23, 0x40]);
        assert_eq!(copy.row(1), &[0x56, 0x78, 0x90]);
        assert_eq!(copy.palette(), Some(&palette));
    }

    #[test]
    fn test_clone_non_indexed_has_no_palette() {
        let data = padded_rgb24();
        let view = FrameView::new(3, 2, 12, PixelFormat::Rgb24, &data);
        assert!(clone_frame(&view).expect("clone").palette().is_none());
    }

    #[test]
    fn test_clone_rejects_malformed() {
        let data = vec![0u8; 20];
        let view = FrameView::new(3, 2, 12, PixelFormat::Rgb24, &data);
        assert!(matches!(clone_frame(&view), Err(FrameError::MalformedBuffer(_))));
    }

    #[test]
    fn test_flip_vertical() {
        // Bottom-up 2x3 Gray8 with stride 4
        let data = vec![
            3, 3, 0, 0, //
            2, 2, 0, 0, //
            1, 1, 0, 0,
        ];
        let view = FrameView::new(2, 3, 4, PixelFormat::Gray8, &data);
        let top_down = flip_vertical(&view).expect("flip");

        assert_eq!(top_down.row(0), &[1, 1]);
        assert_eq!(top_down.row(1), &[2, 2]);
        assert_eq!(top_down.row(2), &[3, 3]);

        let back = flip_vertical(&top_down.view()).expect("flip back");
        assert_eq!(back.data(), data.as_slice());
    }
}
