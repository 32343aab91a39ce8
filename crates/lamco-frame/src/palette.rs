//! Color palettes for indexed and grayscale frames

use crate::error::{FrameError, Result};

/// One palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PaletteEntry {
    /// Alpha
    pub a: u8,
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl PaletteEntry {
    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    /// Color with explicit alpha
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Opaque gray level
    pub const fn gray(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    /// Whether the color channels all equal `level` (alpha is ignored)
    pub const fn is_gray_level(self, level: u8) -> bool {
        self.r == level && self.g == level && self.b == level
    }
}

/// Ordered palette of colors
///
/// The palette length is validated against the pixel format when a frame is
/// built; the palette itself is only an ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Create a palette from entries
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    /// 256-entry grayscale palette, entry `i` is `(i, i, i)`
    pub fn grayscale() -> Self {
        Self::gray_ramp(256)
    }

    /// Evenly spaced gray levels from black to white
    ///
    /// A ramp of length 0 is empty, a ramp of length 1 holds black only.
    pub fn gray_ramp(len: usize) -> Self {
        let steps = len.saturating_sub(1).max(1);
        let entries = (0..len)
            .map(|i| PaletteEntry::gray((i * 255 / steps) as u8))
            .collect();
        Self { entries }
    }

    /// Palette entries in order
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<PaletteEntry> {
        self.entries.get(index).copied()
    }

    /// Whether this is the 256-entry grayscale palette
    pub fn is_grayscale(&self) -> bool {
        self.entries.len() == 256
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(i, entry)| entry.is_gray_level(i as u8))
    }

    /// Copy entry-for-entry, surfacing allocation failure
    pub(crate) fn try_copy(&self) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(self.entries.len()).map_err(|_| FrameError::OutOfMemory {
            requested: self.entries.len() * std::mem::size_of::<PaletteEntry>(),
        })?;
        entries.extend_from_slice(&self.entries);
        Ok(Self { entries })
    }
}

impl From<Vec<PaletteEntry>> for Palette {
    fn from(entries: Vec<PaletteEntry>) -> Self {
        Self::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_palette() {
        let palette = Palette::grayscale();
        assert_eq!(palette.len(), 256);
        for (i, entry) in palette.entries().iter().enumerate() {
            assert_eq!(*entry, PaletteEntry::gray(i as u8));
            assert_eq!(entry.a, 255);
        }
        assert!(palette.is_grayscale());
    }

    #[test]
    fn test_gray_ramp() {
        let ramp = Palette::gray_ramp(2);
        assert_eq!(ramp.entries(), &[PaletteEntry::gray(0), PaletteEntry::gray(255)]);

        let ramp = Palette::gray_ramp(16);
        assert_eq!(ramp.get(0), Some(PaletteEntry::gray(0)));
        assert_eq!(ramp.get(1), Some(PaletteEntry::gray(17)));
        assert_eq!(ramp.get(15), Some(PaletteEntry::gray(255)));

        assert!(Palette::gray_ramp(0).is_empty());
        assert_eq!(Palette::gray_ramp(1).len(), 1);
    }

    #[test]
    fn test_not_grayscale() {
        let mut entries = Palette::grayscale().entries().to_vec();
        entries[128] = PaletteEntry::rgb(128, 0, 128);
        assert!(!Palette::new(entries).is_grayscale());

        // Right colors, wrong length
        assert!(!Palette::gray_ramp(16).is_grayscale());
    }

    #[test]
    fn test_try_copy_preserves_order() {
        let palette = Palette::new(vec![
            PaletteEntry::rgb(1, 2, 3),
            PaletteEntry::argb(0, 9, 8, 7),
        ]);
        let copy = palette.try_copy().expect("copy");
        assert_eq!(copy, palette);
    }
}
