//! # lamco-frame
//!
//! Owned frame buffers, 16-bit to 8-bit pixel conversion and deep frame
//! cloning for capture pipelines.
//!
//! This crate is part of the [lamco-vcam](https://github.com/lamco-admin/lamco-vcam)
//! workspace and provides the frame types used by
//! [`lamco-capture`](https://crates.io/crates/lamco-capture).
//!
//! # Features
//!
//! - **Frame Buffers**: Single-owner pixel buffers with validated stride and palette
//! - **Borrowed Views**: Zero-copy descriptors for frames handed out by capture callbacks
//! - **Bit Depth Conversion**: Gray16/Rgb48/Argb64 to their 8-bit counterparts
//! - **Deep Cloning**: Stride-aware row copies including palettes
//! - **Row Flipping**: Bottom-up to top-down conversion for DIB sample buffers
//!
//! # Quick Start
//!
//! ```rust
//! use lamco_frame::{clone_frame, convert_to_8bit, FrameView, PixelFormat};
//!
//! // Inside a capture callback: the bytes are only borrowed
//! # let captured = vec![0u8; 4 * 2 * 6];
//! let view = FrameView::new(4, 2, 24, PixelFormat::Rgb48, &captured);
//!
//! // Keep a copy past the callback
//! let owned = clone_frame(&view)?;
//!
//! // Or narrow it for display
//! let rgb24 = convert_to_8bit(&view)?;
//! assert_eq!(rgb24.format(), PixelFormat::Rgb24);
//! assert_eq!(owned.format(), PixelFormat::Rgb48);
//! # Ok::<(), lamco_frame::FrameError>(())
//! ```
//!
//! # Ownership Model
//!
//! ```text
//! ┌────────────────────┐
//! │  Capture callback  │
//! │  (FrameView<'cb>)  │ ◄── Bytes owned by the producer
//! └─────────┬──────────┘
//!           │
//!     ┌─────┴───────────────┐
//!     ▼                     ▼
//! ┌──────────────┐   ┌──────────────────┐
//! │ clone_frame  │   │ convert_to_8bit  │
//! └──────┬───────┘   └────────┬─────────┘
//!        ▼                    ▼
//! ┌────────────────────────────────────┐
//! │  FrameBuffer (new, single owner)   │
//! └────────────────────────────────────┘
//! ```
//!
//! Buffers are never mutated into another shape: conversion and cloning
//! always allocate a new [`FrameBuffer`].

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod buffer;
pub mod clone;
pub mod convert;
pub mod error;
pub mod format;
pub mod palette;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

pub use buffer::{FrameBuffer, FrameView};
pub use clone::{clone_frame, flip_vertical};
pub use convert::{convert_to_8bit, narrow_sample, FormatConverter};
pub use error::{FrameError, Result};
pub use format::{PixelFormat, ROW_ALIGNMENT};
pub use palette::{Palette, PaletteEntry};

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if a frame is 8-bit grayscale
///
/// True for Gray8 frames and for Indexed8 frames whose palette is the
/// 256-entry grayscale palette.
#[must_use]
pub fn is_grayscale(frame: &FrameView<'_>) -> bool {
    match frame.format {
        PixelFormat::Gray8 | PixelFormat::Indexed8 => frame
            .resolved_palette()
            .is_some_and(|palette| palette.is_grayscale()),
        _ => false,
    }
}
