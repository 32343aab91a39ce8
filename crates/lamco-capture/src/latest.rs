//! Latest-frame holder for display paths
//!
//! The capture callback stores every frame; a paint routine on another
//! thread asks for a snapshot whenever it redraws. Frames with 16-bit
//! channels are narrowed on store, so snapshots are always displayable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lamco_frame::{clone_frame, convert_to_8bit, FrameBuffer, FrameView, Result};
use parking_lot::Mutex;

/// Most recent frame, behind a lock
#[derive(Debug, Default)]
pub struct LatestFrame {
    current: Mutex<Option<FrameBuffer>>,
    stored: AtomicU64,
}

impl LatestFrame {
    /// Create an empty holder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame with a copy of `frame`
    ///
    /// The copy is made before the lock is taken.
    pub fn store(&self, frame: &FrameView<'_>) -> Result<()> {
        let owned = if frame.format.is_16bit_per_channel() {
            convert_to_8bit(frame)?
        } else {
            clone_frame(frame)?
        };

        let previous = self.current.lock().replace(owned);
        drop(previous);
        self.stored.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Independent copy of the current frame
    pub fn snapshot(&self) -> Result<Option<FrameBuffer>> {
        self.current.lock().as_ref().map(FrameBuffer::deep_clone).transpose()
    }

    /// Remove and return the current frame
    pub fn take(&self) -> Option<FrameBuffer> {
        self.current.lock().take()
    }

    /// Drop the current frame
    pub fn clear(&self) {
        let previous = self.current.lock().take();
        drop(previous);
    }

    /// Width and height of the current frame
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.current
            .lock()
            .as_ref()
            .map(|frame| (frame.width(), frame.height()))
    }

    /// Frames stored since creation
    pub fn frames_stored(&self) -> u64 {
        self.stored.load(Ordering::Relaxed)
    }

    /// Frame callback storing into this holder
    pub fn callback(self: &Arc<Self>) -> impl FnMut(FrameView<'_>) -> Result<()> + Send + 'static {
        let latest = Arc::clone(self);
        move |frame: FrameView<'_>| latest.store(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamco_frame::{FrameError, PixelFormat};

    #[test]
    fn test_empty() {
        let latest = LatestFrame::new();
        assert!(latest.snapshot().expect("snapshot").is_none());
        assert!(latest.dimensions().is_none());
        assert_eq!(latest.frames_stored(), 0);
    }

    #[test]
    fn test_store_and_snapshot() {
        let latest = LatestFrame::new();
        let mut data = vec![9u8, 8, 7, 0];
        latest
            .store(&FrameView::new(3, 1, 4, PixelFormat::Gray8, &data))
            .expect("store");
        data.fill(0);

        let mut first = latest.snapshot().expect("snapshot").expect("frame present");
        assert_eq!(first.row(0), &[9, 8, 7]);

        // Snapshots do not alias the stored frame
        first.row_mut(0).fill(1);
        let second = latest.snapshot().expect("snapshot").expect("frame present");
        assert_eq!(second.row(0), &[9, 8, 7]);
        assert_eq!(latest.dimensions(), Some((3, 1)));
    }

    #[test]
    fn test_store_narrows_16bit() {
        let latest = LatestFrame::new();
        let data: Vec<u8> = [0x8040u16; 3].iter().flat_map(|s| s.to_le_bytes()).collect();
        latest
            .store(&FrameView::new(1, 1, 6, PixelFormat::Rgb48, &data))
            .expect("store rgb48");

        let frame = latest.take().expect("frame present");
        assert_eq!(frame.format(), PixelFormat::Rgb24);
        assert_eq!(frame.row(0), &[0x80, 0x80, 0x80]);
        assert!(latest.take().is_none());
    }

    #[test]
    fn test_failed_store_keeps_previous() {
        let latest = LatestFrame::new();
        let good = [1u8, 0, 0, 0];
        latest
            .store(&FrameView::new(1, 1, 4, PixelFormat::Gray8, &good))
            .expect("store");

        let short = [0u8; 2];
        let err = latest
            .store(&FrameView::new(1, 1, 4, PixelFormat::Gray8, &short))
            .expect_err("malformed");
        assert!(matches!(err, FrameError::MalformedBuffer(_)));
        assert_eq!(latest.frames_stored(), 1);
        assert_eq!(latest.dimensions(), Some((1, 1)));

        latest.clear();
        assert!(latest.dimensions().is_none());
    }

    #[test]
    fn test_callback_stores() {
        let latest = Arc::new(LatestFrame::new());
        let mut callback = latest.callback();
        let data = [3u8, 0, 0, 0];
        callback(FrameView::new(1, 1, 4, PixelFormat::Gray8, &data)).expect("callback");
        assert_eq!(latest.frames_stored(), 1);
    }
}
