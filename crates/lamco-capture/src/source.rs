//! Frame source boundary
//!
//! A [`FrameSource`] is whatever actually produces pixels: a camera graph, a
//! screen grabber or the synthetic [`PatternSource`](crate::PatternSource).
//! The capture thread owns the source and drives it through
//! [`FrameSource::poll`], handing it a [`FrameSink`] to deliver frames into.

use std::sync::atomic::Ordering;

use lamco_frame::{convert_to_8bit, FrameError, FrameView};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::Result;
use crate::session::{CaptureEvent, Shared};

/// What the source reports after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Keep polling
    Running,
    /// No more frames will come
    EndOfStream,
    /// The device was disconnected
    DeviceLost,
}

/// Producer of frames, driven by a capture thread
///
/// All methods are called on the capture thread, never concurrently.
pub trait FrameSource: Send + 'static {
    /// Name used for the capture thread and log messages
    fn name(&self) -> &str;

    /// Acquire the device
    ///
    /// Called once before the first poll. A failure ends the session with
    /// [`FinishReason::SourceError`](crate::FinishReason::SourceError).
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Deliver zero or more frames into `sink`
    ///
    /// Should return promptly; the stop signal is only checked between
    /// polls. Blocking for longer than the stop timeout makes
    /// [`CaptureSession::wait_for_stop`](crate::CaptureSession::wait_for_stop)
    /// report a timeout.
    fn poll(&mut self, sink: &mut FrameSink<'_>) -> Result<SourceStatus>;

    /// Release the device
    ///
    /// Called once on the capture thread after the last poll, also when
    /// [`FrameSource::open`] failed.
    fn close(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn poll(&mut self, sink: &mut FrameSink<'_>) -> Result<SourceStatus> {
        (**self).poll(sink)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Frame callback signature
pub type FrameCallback<'a> = dyn FnMut(FrameView<'_>) -> std::result::Result<(), FrameError> + 'a;

/// Delivery endpoint handed to [`FrameSource::poll`]
///
/// Runs the frame callback synchronously. The frame view only has to stay
/// valid for the duration of [`FrameSink::deliver`].
pub struct FrameSink<'a> {
    callback: &'a mut FrameCallback<'a>,
    session: Option<(&'a Shared, &'a mpsc::UnboundedSender<CaptureEvent>)>,
    convert_16bit: bool,
    delivered: u64,
    failed: u64,
}

impl<'a> FrameSink<'a> {
    /// Sink bound to a running capture session
    pub(crate) fn attached(
        callback: &'a mut FrameCallback<'a>,
        shared: &'a Shared,
        events: &'a mpsc::UnboundedSender<CaptureEvent>,
        convert_16bit: bool,
    ) -> Self {
        Self {
            callback,
            session: Some((shared, events)),
            convert_16bit,
            delivered: 0,
            failed: 0,
        }
    }

    /// Sink that only runs the callback
    ///
    /// Callback failures are logged and counted. Useful for driving a source
    /// without a capture thread.
    pub fn detached(callback: &'a mut FrameCallback<'a>) -> Self {
        Self {
            callback,
            session: None,
            convert_16bit: false,
            delivered: 0,
            failed: 0,
        }
    }

    /// Narrow 16-bit frames before they reach the callback
    #[must_use]
    pub fn with_16bit_conversion(mut self, enable: bool) -> Self {
        self.convert_16bit = enable;
        self
    }

    /// Hand one frame to the callback
    ///
    /// Returns `true` if the callback ran and succeeded. Frames arriving
    /// after a stop request are counted but not passed on.
    pub fn deliver(&mut self, frame: FrameView<'_>) -> bool {
        if let Some((shared, _)) = self.session {
            shared.frames_received.fetch_add(1, Ordering::Relaxed);
            shared.bytes_received.fetch_add(payload_bytes(&frame), Ordering::Relaxed);
        }
        if self.is_stopping() {
            return false;
        }

        let result = if self.convert_16bit && frame.format.is_16bit_per_channel() {
            convert_to_8bit(&frame).and_then(|converted| (self.callback)(converted.view()))
        } else {
            (self.callback)(frame)
        };

        match result {
            Ok(()) => {
                self.delivered += 1;
                true
            }
            Err(e) => {
                self.failed += 1;
                warn!("Frame callback failed for {}x{} {}: {}", frame.width, frame.height, frame.format, e);
                if let Some((_, events)) = self.session {
                    let _ = events.send(CaptureEvent::CallbackFailed(e));
                }
                false
            }
        }
    }

    /// Check if stop was requested
    ///
    /// Sources that deliver several frames per poll can return early.
    pub fn is_stopping(&self) -> bool {
        self.session.is_some_and(|(shared, _)| shared.stop.is_set())
    }

    /// Frames the callback accepted through this sink
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Frames the callback (or the 16-bit conversion) rejected through this sink
    pub fn failed(&self) -> u64 {
        self.failed
    }
}

/// Payload size as the device reports it, row padding excluded
fn payload_bytes(frame: &FrameView<'_>) -> u64 {
    u64::from(frame.width) * u64::from(frame.height) * u64::from(frame.format.bits_per_pixel()) / 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamco_frame::PixelFormat;

    #[test]
    fn test_detached_sink_runs_callback() {
        let mut seen = Vec::new();
        let mut callback = |frame: FrameView<'_>| -> lamco_frame::Result<()> {
            seen.push(frame.row(0).to_vec());
            Ok(())
        };
        let mut sink = FrameSink::detached(&mut callback);

        let data = [7u8, 8, 9, 0];
        assert!(sink.deliver(FrameView::new(3, 1, 4, PixelFormat::Gray8, &data)));
        assert_eq!(sink.delivered(), 1);
        assert!(!sink.is_stopping());
        drop(sink);

        assert_eq!(seen, vec![vec![7, 8, 9]]);
    }

    #[test]
    fn test_detached_sink_counts_failures() {
        let mut callback =
            |_frame: FrameView<'_>| -> lamco_frame::Result<()> { Err(FrameError::UnsupportedFormat("Rgb24".to_string())) };
        let mut sink = FrameSink::detached(&mut callback);

        let data = [0u8; 4];
        assert!(!sink.deliver(FrameView::new(1, 1, 4, PixelFormat::Rgb24, &data)));
        assert_eq!(sink.delivered(), 0);
        assert_eq!(sink.failed(), 1);
    }

    #[test]
    fn test_sink_narrows_16bit_frames() {
        let mut formats = Vec::new();
        let mut callback = |frame: FrameView<'_>| -> lamco_frame::Result<()> {
            formats.push((frame.format, frame.row(0).to_vec()));
            Ok(())
        };
        let mut sink = FrameSink::detached(&mut callback).with_16bit_conversion(true);

        let gray16 = [0x34u8, 0x12, 0xCD, 0xAB];
        let gray8 = [0x55u8, 0, 0, 0];
        assert!(sink.deliver(FrameView::new(2, 1, 4, PixelFormat::Gray16, &gray16)));
        assert!(sink.deliver(FrameView::new(1, 1, 4, PixelFormat::Gray8, &gray8)));
        drop(sink);

        assert_eq!(
            formats,
            vec![
                (PixelFormat::Gray8, vec![0x12, 0xAB]),
                (PixelFormat::Gray8, vec![0x55]),
            ]
        );
    }

    #[test]
    fn test_payload_bytes_ignore_padding() {
        let data = [0u8; 32];
        assert_eq!(payload_bytes(&FrameView::new(3, 2, 16, PixelFormat::Rgb24, &data)), 18);
        assert_eq!(payload_bytes(&FrameView::new(9, 3, 4, PixelFormat::Indexed1, &data)), 3);
        assert_eq!(payload_bytes(&FrameView::new(2, 2, 8, PixelFormat::Gray16, &data)), 8);
    }

    #[test]
    fn test_sink_reports_malformed_16bit_frame() {
        let mut calls = 0;
        let mut callback = |_frame: FrameView<'_>| -> lamco_frame::Result<()> {
            calls += 1;
            Ok(())
        };
        let mut sink = FrameSink::detached(&mut callback).with_16bit_conversion(true);

        // 2x1 Gray16 needs 4 bytes
        let short = [0u8; 3];
        assert!(!sink.deliver(FrameView::new(2, 1, 3, PixelFormat::Gray16, &short)));
        assert_eq!(sink.failed(), 1);
        drop(sink);
        assert_eq!(calls, 0);
    }
}
