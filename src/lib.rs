//! # lamco-vcam
//!
//! Frame handling for video capture: 16-bit to 8-bit pixel conversion,
//! deep frame cloning and threaded capture sessions.
//!
//! This crate provides a unified interface to the lamco capture libraries:
//!
//! - **[`frame`]** - Frame buffers, pixel formats, palettes, conversion and cloning
//! - **[`capture`]** - Capture sessions, session replacement, frame relay and latest-frame holder
//!
//! # Features
//!
//! All features are enabled by default. You can selectively enable only what you need:
//!
//! ```toml
//! # Use everything (default)
//! lamco-vcam = "0.1"
//!
//! # Frame types only
//! lamco-vcam = { version = "0.1", default-features = false, features = ["frame"] }
//! ```
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `frame` | Yes | Frame buffers and pixel conversion |
//! | `capture` | Yes | Capture sessions (implies `frame`) |
//! | `full` | No | All features from all sub-crates |
//!
//! # Quick Start
//!
//! ## Narrowing a captured frame
//!
//! ```rust
//! use lamco_vcam::frame::{convert_to_8bit, FrameView, PixelFormat};
//!
//! // 4x2 Rgb48 frame as a capture callback would see it
//! let pixels = [0x40u8, 0x80].repeat(4 * 2 * 3);
//! let view = FrameView::new(4, 2, 24, PixelFormat::Rgb48, &pixels);
//!
//! let rgb24 = convert_to_8bit(&view)?;
//! assert_eq!(rgb24.row(0), &[0x80; 12]);
//! # Ok::<(), lamco_vcam::frame::FrameError>(())
//! ```
//!
//! ## Capture → Relay → Processing
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lamco_vcam::prelude::*;
//!
//! let relay = Arc::new(FrameRelay::start(RelayPolicy::SkipIfBusy, |frame| {
//!     // Owned copy, safe to keep
//!     let _ = frame.into_data();
//! })?);
//!
//! let source = PatternSource::new("pattern", 320, 240, PixelFormat::Rgb24)?.end_after(10);
//! let config = CaptureConfig::builder().poll_interval_ms(1).build();
//! let mut session = CaptureSession::start(source, config, relay.callback())?;
//!
//! assert_eq!(session.wait_for_stop(Duration::from_secs(5))?, FinishReason::EndOfStream);
//! relay.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         lamco-vcam                          │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │         lamco-frame          │        lamco-capture         │
//! │                              │                              │
//! │  FrameBuffer / FrameView     │  CaptureSession / FrameSource│
//! │  convert_to_8bit             │  SessionSlot                 │
//! │  clone_frame / flip_vertical │  FrameRelay / LatestFrame    │
//! └──────────────┬───────────────┴───────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!        Owned pixel buffers           Capture device boundary
//! ```
//!
//! # Related Crates
//!
//! You can also use the individual crates directly:
//!
//! - [`lamco-frame`](https://crates.io/crates/lamco-frame) - Frame types only
//! - [`lamco-capture`](https://crates.io/crates/lamco-capture) - Capture sessions

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// RE-EXPORTS
// =============================================================================

/// Frame buffers and pixel conversion.
///
/// This module provides:
/// - Owned frame buffers and borrowed callback views
/// - Gray16/Rgb48/Argb64 to 8-bit conversion
/// - Stride-aware deep cloning with palettes
/// - Vertical flipping of bottom-up buffers
///
/// See [`lamco_frame`] documentation for details.
#[cfg(feature = "frame")]
#[cfg_attr(docsrs, doc(cfg(feature = "frame")))]
pub use lamco_frame as frame;

/// Threaded capture sessions.
///
/// This module provides:
/// - The frame source boundary and capture thread
/// - Bounded two-phase stop with reportable timeouts
/// - Session replacement
/// - One-slot frame relay and latest-frame holder
///
/// See [`lamco_capture`] documentation for details.
#[cfg(feature = "capture")]
#[cfg_attr(docsrs, doc(cfg(feature = "capture")))]
pub use lamco_capture as capture;

// =============================================================================
// PRELUDE - Common types for convenience
// =============================================================================

/// Prelude module with commonly used types.
///
/// ```rust
/// use lamco_vcam::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "frame")]
    pub use lamco_frame::{
        clone_frame, convert_to_8bit, FrameBuffer, FrameError, FrameView, Palette, PaletteEntry, PixelFormat,
    };

    #[cfg(feature = "capture")]
    pub use lamco_capture::{
        CaptureConfig, CaptureError, CaptureEvent, CaptureSession, FinishReason, FrameRelay, FrameSink, FrameSource,
        LatestFrame, PatternSource, RelayPolicy, SessionSlot, SourceStatus,
    };
}
