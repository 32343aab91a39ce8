//! Pixel formats
//!
//! The format set mirrors the bitmap formats produced by desktop and webcam
//! capture graphs. Each format carries a numeric tag equal to the GDI+
//! `PixelFormat` constant, so a native callback can hand its tag over as-is.
//!
//! # Layout
//!
//! | Format | BPP | Channels | 8-bit form |
//! |--------|-----|----------|------------|
//! | Gray16 | 16 | 1 | Gray8 |
//! | Rgb48 | 48 | 3 | Rgb24 |
//! | Argb64 | 64 | 4 | Argb32 |
//! | PArgb64 | 64 | 4 | PArgb32 |
//! | Gray8 | 8 | 1 | - |
//! | Rgb24 | 24 | 3 | - |
//! | Argb32 / PArgb32 | 32 | 4 | - |
//! | Indexed8 / Indexed4 / Indexed1 | 8 / 4 / 1 | 1 | - |
//!
//! Multi-byte samples are stored little-endian.

use std::fmt;

use crate::error::{FrameError, Result};

/// Alignment in bytes of rows in freshly allocated frames (DIB row alignment)
pub const ROW_ALIGNMENT: usize = 4;

/// Pixel format of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 16-bit grayscale
    Gray16,
    /// 8-bit grayscale, carries the 256-entry grayscale palette
    Gray8,
    /// 16 bits per channel RGB
    Rgb48,
    /// 8 bits per channel RGB
    Rgb24,
    /// 16 bits per channel ARGB
    Argb64,
    /// 16 bits per channel premultiplied ARGB
    PArgb64,
    /// 8 bits per channel ARGB
    Argb32,
    /// 8 bits per channel premultiplied ARGB
    PArgb32,
    /// 8-bit palette index
    Indexed8,
    /// 4-bit palette index, two pixels per byte
    Indexed4,
    /// 1-bit palette index, eight pixels per byte
    Indexed1,
}

impl PixelFormat {
    /// Every supported format
    pub const ALL: [PixelFormat; 11] = [
        Self::Gray16,
        Self::Gray8,
        Self::Rgb48,
        Self::Rgb24,
        Self::Argb64,
        Self::PArgb64,
        Self::Argb32,
        Self::PArgb32,
        Self::Indexed8,
        Self::Indexed4,
        Self::Indexed1,
    ];

    /// Bits used by one pixel
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Indexed1 => 1,
            Self::Indexed4 => 4,
            Self::Gray8 | Self::Indexed8 => 8,
            Self::Gray16 => 16,
            Self::Rgb24 => 24,
            Self::Argb32 | Self::PArgb32 => 32,
            Self::Rgb48 => 48,
            Self::Argb64 | Self::PArgb64 => 64,
        }
    }

    /// Bytes used by one pixel, `None` for sub-byte formats
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Indexed1 | Self::Indexed4 => None,
            other => Some(other.bits_per_pixel() as usize / 8),
        }
    }

    /// Number of color channels stored per pixel
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray16 | Self::Gray8 | Self::Indexed8 | Self::Indexed4 | Self::Indexed1 => 1,
            Self::Rgb48 | Self::Rgb24 => 3,
            Self::Argb64 | Self::PArgb64 | Self::Argb32 | Self::PArgb32 => 4,
        }
    }

    /// Whether pixels are palette indices
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Indexed8 | Self::Indexed4 | Self::Indexed1)
    }

    /// Whether frames of this format carry a palette
    ///
    /// True for the indexed formats and for [`PixelFormat::Gray8`], which is
    /// stored as an 8-bit index into the grayscale palette.
    pub const fn has_palette(self) -> bool {
        self.is_indexed() || matches!(self, Self::Gray8)
    }

    /// Required palette length (`2^bits_per_pixel`) for palette formats
    pub const fn palette_len(self) -> Option<usize> {
        if self.has_palette() {
            Some(1 << self.bits_per_pixel())
        } else {
            None
        }
    }

    /// Whether each channel is a 16-bit sample
    pub const fn is_16bit_per_channel(self) -> bool {
        matches!(self, Self::Gray16 | Self::Rgb48 | Self::Argb64 | Self::PArgb64)
    }

    /// Whether color channels are premultiplied by alpha
    pub const fn is_premultiplied(self) -> bool {
        matches!(self, Self::PArgb64 | Self::PArgb32)
    }

    /// 8-bit-per-channel counterpart with the same channel count
    ///
    /// Returns `None` for formats that are not 16 bits per channel.
    pub const fn to_8bit(self) -> Option<PixelFormat> {
        match self {
            Self::Gray16 => Some(Self::Gray8),
            Self::Rgb48 => Some(Self::Rgb24),
            Self::Argb64 => Some(Self::Argb32),
            Self::PArgb64 => Some(Self::PArgb32),
            _ => None,
        }
    }

    /// Numeric tag as passed through the capture callback
    pub const fn tag(self) -> u32 {
        match self {
            Self::Indexed1 => 0x0003_0101,
            Self::Indexed4 => 0x0003_0402,
            Self::Indexed8 => 0x0003_0803,
            Self::Gray16 => 0x0010_1004,
            Self::Rgb24 => 0x0002_1808,
            Self::Argb32 => 0x0026_200A,
            Self::PArgb32 => 0x000E_200B,
            Self::Rgb48 => 0x0010_300C,
            Self::Argb64 => 0x0034_400D,
            Self::PArgb64 => 0x001C_400E,
            // No GDI+ constant exists for 8-bit gray
            Self::Gray8 => 0x0000_0808,
        }
    }

    /// Look up a format by its callback tag
    pub fn from_tag(tag: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.tag() == tag)
            .ok_or_else(|| FrameError::unsupported(format!("unknown pixel format tag {tag:#010x}")))
    }

    /// Bytes holding the pixels of one row, excluding padding
    pub fn min_row_bytes(self, width: u32) -> usize {
        (width as usize * self.bits_per_pixel() as usize).div_ceil(8)
    }

    /// Stride of a freshly allocated row, padded to [`ROW_ALIGNMENT`]
    pub fn aligned_stride(self, width: u32) -> usize {
        let row = self.min_row_bytes(width);
        (row + ROW_ALIGNMENT - 1) & !(ROW_ALIGNMENT - 1)
    }
}

impl TryFrom<u32> for PixelFormat {
    type Error = FrameError;

    fn try_from(tag: u32) -> Result<Self> {
        Self::from_tag(tag)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gray16 => "Gray16",
            Self::Gray8 => "Gray8",
            Self::Rgb48 => "Rgb48",
            Self::Rgb24 => "Rgb24",
            Self::Argb64 => "Argb64",
            Self::PArgb64 => "PArgb64",
            Self::Argb32 => "Argb32",
            Self::PArgb32 => "PArgb32",
            Self::Indexed8 => "Indexed8",
            Self::Indexed4 => "Indexed4",
            Self::Indexed1 => "Indexed1",
        };
        f.write_str(name)
    }
}
