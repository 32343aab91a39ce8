//! Synthetic frame source
//!
//! [`PatternSource`] produces frames without any device: every pixel byte of
//! frame `n` is the low byte of `n`, row padding is filled with
//! [`PADDING_BYTE`]. It can be scripted to end, lose its device or fail
//! after a given number of frames, which makes session behavior testable
//! without hardware.

use std::thread;
use std::time::Duration;

use lamco_frame::{FrameError, FrameView, Palette, PixelFormat};
use tracing::debug;

use crate::error::{CaptureError, Result};
use crate::source::{FrameSink, FrameSource, SourceStatus};

/// Value of every row padding byte
pub const PADDING_BYTE: u8 = 0xAA;

/// Pixel byte value of frame `frame_number`
pub fn pattern_byte(frame_number: u64) -> u8 {
    frame_number.to_le_bytes()[0]
}

#[derive(Debug, Clone)]
enum Ending {
    EndOfStream,
    DeviceLost,
    Fail(String),
}

/// Device-free [`FrameSource`]
#[derive(Debug)]
pub struct PatternSource {
    name: String,
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    palette: Option<Palette>,
    buffer: Vec<u8>,
    produced: u64,
    ending: Option<(u64, Ending)>,
    open_error: Option<String>,
    poll_delay: Duration,
}

impl PatternSource {
    /// Frames of `width` x `height` in `format`, with an aligned stride
    ///
    /// Indexed formats get a gray ramp palette of the right length.
    pub fn new(name: impl Into<String>, width: u32, height: u32, format: PixelFormat) -> lamco_frame::Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }

        let palette = if format.is_indexed() {
            format.palette_len().map(Palette::gray_ramp)
        } else {
            None
        };

        Ok(Self {
            name: name.into(),
            width,
            height,
            format,
            stride: format.aligned_stride(width),
            palette,
            buffer: Vec::new(),
            produced: 0,
            ending: None,
            open_error: None,
            poll_delay: Duration::ZERO,
        })
    }

    /// Add `extra` padding bytes to every row
    #[must_use]
    pub fn with_padding(mut self, extra: usize) -> Self {
        self.stride = self.stride.saturating_add(extra);
        self
    }

    /// Attach a palette to every frame
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Sleep this long inside every poll
    ///
    /// Simulates a device that blocks while waiting for the next frame.
    #[must_use]
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Report end of stream after `frames` frames
    #[must_use]
    pub fn end_after(mut self, frames: u64) -> Self {
        self.ending = Some((frames, Ending::EndOfStream));
        self
    }

    /// Report device loss after `frames` frames
    #[must_use]
    pub fn lose_device_after(mut self, frames: u64) -> Self {
        self.ending = Some((frames, Ending::DeviceLost));
        self
    }

    /// Fail with `message` after `frames` frames
    #[must_use]
    pub fn fail_after(mut self, frames: u64, message: impl Into<String>) -> Self {
        self.ending = Some((frames, Ending::Fail(message.into())));
        self
    }

    /// Fail to open with `message`
    #[must_use]
    pub fn fail_on_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Row stride of produced frames
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Frames produced so far
    pub fn frames_produced(&self) -> u64 {
        self.produced
    }

    /// Fill the buffer with frame `n`, padding untouched
    fn paint(&mut self, frame_number: u64) {
        let value = pattern_byte(frame_number);
        let row_bytes = self.format.min_row_bytes(self.width);
        for row in self.buffer.chunks_exact_mut(self.stride) {
            row[..row_bytes].fill(value);
        }
    }
}

impl FrameSource for PatternSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if let Some(message) = &self.open_error {
            return Err(CaptureError::source_failed(message.clone()));
        }

        let height = usize::try_from(self.height).map_err(|_| CaptureError::source_failed("height too large"))?;
        let len = self
            .stride
            .checked_mul(height)
            .ok_or(FrameError::OutOfMemory { requested: usize::MAX })?;
        self.buffer = vec![PADDING_BYTE; len];

        debug!(
            "Pattern source {} opened: {}x{} {} stride {}",
            self.name, self.width, self.height, self.format, self.stride
        );
        Ok(())
    }

    fn poll(&mut self, sink: &mut FrameSink<'_>) -> Result<SourceStatus> {
        if !self.poll_delay.is_zero() {
            thread::sleep(self.poll_delay);
        }

        match &self.ending {
            Some((after, ending)) if self.produced >= *after => {
                return match ending {
                    Ending::EndOfStream => Ok(SourceStatus::EndOfStream),
                    Ending::DeviceLost => Ok(SourceStatus::DeviceLost),
                    Ending::Fail(message) => Err(CaptureError::source_failed(message.clone())),
                };
            }
            _ => {}
        }

        let frame_number = self.produced;
        self.paint(frame_number);
        self.produced += 1;

        let mut view = FrameView::new(self.width, self.height, self.stride, self.format, &self.buffer);
        if let Some(palette) = &self.palette {
            view = view.with_palette(palette);
        }
        sink.deliver(view);

        Ok(SourceStatus::Running)
    }

    fn close(&mut self) {
        self.buffer = Vec::new();
        debug!("Pattern source {} closed after {} frames", self.name, self.produced);
    }
}
