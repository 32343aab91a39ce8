//! # lamco-capture
//!
//! Threaded capture sessions with callback frame delivery, bounded two-phase
//! stop and a one-slot relay to a processing thread.
//!
//! This crate is part of the [lamco-vcam](https://github.com/lamco-admin/lamco-vcam)
//! workspace and builds on the frame types of
//! [`lamco-frame`](https://crates.io/crates/lamco-frame).
//!
//! # Features
//!
//! - **Source Boundary**: Any device is a [`FrameSource`] polled on a dedicated thread
//! - **Ordered Delivery**: Frame callbacks run sequentially, in capture order
//! - **Two-Phase Stop**: Signal, then wait a bounded time; timeouts are reported, threads are never killed
//! - **Event Channel**: Device loss, source failures and session end arrive on a tokio channel
//! - **Session Replacement**: [`SessionSlot`] joins the old session before starting the next
//! - **Frame Relay**: Skip-if-busy or blocking handoff to a processing thread
//! - **Latest Frame**: Lock-protected current frame for paint routines
//!
//! # Quick Start
//!
//! ```rust
//! use lamco_capture::{CaptureConfig, CaptureEvent, CaptureSession, PatternSource};
//! use lamco_frame::PixelFormat;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = PatternSource::new("pattern", 640, 480, PixelFormat::Rgb48)?;
//! let config = CaptureConfig::builder().convert_16bit(true).build();
//!
//! let mut session = CaptureSession::start(source, config, |frame| {
//!     // 16-bit frames arrive narrowed to 8 bits
//!     assert_eq!(frame.format, PixelFormat::Rgb24);
//!     Ok(())
//! })?;
//!
//! let mut events = session.take_events().expect("first call");
//! session.signal_stop();
//! while let Some(event) = events.recv().await {
//!     if let CaptureEvent::Finished(reason) = event {
//!         println!("{reason}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Owner thread                          │
//! │                                                          │
//! │  CaptureSession / SessionSlot                            │
//! │     │ signal_stop()            ▲ wait_for_stop()         │
//! │     ▼                          │ (bounded)               │
//! └─────┼──────────────────────────┼─────────────────────────┘
//!       │ stop signal              │ exit latch
//! ┌─────▼──────────────────────────┼─────────────────────────┐
//! │            Capture thread (std::thread)                  │
//! │                                                          │
//! │  FrameSource::poll ─▶ FrameSink::deliver ─▶ on_frame     │
//! │                                               │          │
//! │                         CaptureEvent via mpsc │          │
//! └───────────────────────────────────────────────┼──────────┘
//!                                                 │ clone
//!                                   ┌─────────────▼──────────┐
//!                                   │ FrameRelay / LatestFrame│
//!                                   └────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! [`CaptureError`] wraps frame errors and adds device and lifecycle
//! failures. [`classify_error`] and [`recovery_action`] help decide
//! between retrying, restarting the session and giving up.

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod error;
pub mod session;
pub mod source;

// =============================================================================
// DELIVERY MODULES
// =============================================================================

pub mod latest;
pub mod pattern;
pub mod relay;
pub mod slot;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

pub use config::{CaptureConfig, CaptureConfigBuilder};
pub use error::{classify_error, recovery_action, CaptureError, ErrorType, RecoveryAction, Result};
pub use session::{CaptureEvent, CaptureSession, FinishReason, SessionState};
pub use source::{FrameCallback, FrameSink, FrameSource, SourceStatus};

// =============================================================================
// RE-EXPORTS - DELIVERY
// =============================================================================

pub use latest::LatestFrame;
pub use pattern::{pattern_byte, PatternSource, PADDING_BYTE};
pub use relay::{FrameRelay, RelayPolicy, RelayStats};
pub use slot::SessionSlot;

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
