//! One-slot frame relay
//!
//! Moves frames off the capture thread onto a processing thread. The relay
//! holds at most one frame in flight: the capture callback clones the frame
//! into the slot and the processing thread takes it from there.
//!
//! ```text
//! capture thread              relay slot            processing thread
//! ──────────────              ──────────            ─────────────────
//! offer(&view) ──clone──▶  [ FrameBuffer ]  ──take──▶  handler(frame)
//!      │                         ▲
//!      └── busy? Wait: block ────┘
//!                SkipIfBusy: drop the new frame
//! ```
//!
//! # Examples
//!
//! ```rust
//! use lamco_capture::{FrameRelay, RelayPolicy};
//! use lamco_frame::{FrameView, PixelFormat};
//!
//! let relay = FrameRelay::start(RelayPolicy::Wait, |frame| {
//!     assert_eq!(frame.row(0), &[1, 2]);
//! })?;
//!
//! let pixels = [1u8, 2, 0, 0];
//! assert!(relay.offer(&FrameView::new(2, 1, 4, PixelFormat::Gray8, &pixels))?);
//!
//! relay.shutdown();
//! assert_eq!(relay.stats().relayed, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lamco_frame::{clone_frame, FrameBuffer, FrameView};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::CaptureConfig;
use crate::error::Result;

/// What to do with a frame offered while the processor is busy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayPolicy {
    /// Block the producer until the processor is free
    #[default]
    Wait,
    /// Drop the new frame
    SkipIfBusy,
}

/// Relay counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    /// Frames the handler finished processing
    pub relayed: u64,
    /// Frames dropped under [`RelayPolicy::SkipIfBusy`]
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<FrameBuffer>,
    busy: bool,
    closed: bool,
}

impl SlotState {
    fn occupied(&self) -> bool {
        self.busy || self.pending.is_some()
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<SlotState>,
    frame_ready: Condvar,
    slot_free: Condvar,
    relayed: AtomicU64,
    dropped: AtomicU64,
}

impl Inner {
    fn close(&self) {
        self.state.lock().closed = true;
        self.frame_ready.notify_all();
        self.slot_free.notify_all();
    }
}

/// Closes the relay if the handler panics
struct WorkerGuard(Arc<Inner>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        {
            let mut state = self.0.state.lock();
            state.busy = false;
            state.pending = None;
        }
        self.0.close();
    }
}

/// One-slot handoff to a processing thread
pub struct FrameRelay {
    policy: RelayPolicy,
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FrameRelay {
    /// Spawn the processing thread
    ///
    /// `handler` receives each relayed frame as an owned buffer, one at a
    /// time, in offer order.
    pub fn start<H>(policy: RelayPolicy, handler: H) -> Result<Self>
    where
        H: FnMut(FrameBuffer) + Send + 'static,
    {
        let inner = Arc::new(Inner::default());
        let worker_inner = Arc::clone(&inner);

        let handle = thread::Builder::new()
            .name("lamco-relay".to_string())
            .spawn(move || run_worker(worker_inner, handler))?;

        debug!("Frame relay started with {:?} policy", policy);

        Ok(Self {
            policy,
            inner,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Spawn the processing thread with the policy from `config`
    pub fn from_config<H>(config: &CaptureConfig, handler: H) -> Result<Self>
    where
        H: FnMut(FrameBuffer) + Send + 'static,
    {
        Self::start(config.relay_policy, handler)
    }

    /// Offer a frame to the processing thread
    ///
    /// Returns `Ok(true)` if the frame was cloned into the slot, `Ok(false)`
    /// if it was dropped because the processor was busy or the relay is
    /// shut down. Under [`RelayPolicy::Wait`] this blocks until the
    /// previous frame has been processed.
    pub fn offer(&self, frame: &FrameView<'_>) -> lamco_frame::Result<bool> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Ok(false);
        }

        if state.occupied() {
            match self.policy {
                RelayPolicy::SkipIfBusy => {
                    self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!("Relay busy, dropping {}x{} frame", frame.width, frame.height);
                    return Ok(false);
                }
                RelayPolicy::Wait => {
                    self.inner
                        .slot_free
                        .wait_while(&mut state, |s| !s.closed && s.occupied());
                    if state.closed {
                        return Ok(false);
                    }
                }
            }
        }

        state.pending = Some(clone_frame(frame)?);
        drop(state);
        self.inner.frame_ready.notify_one();
        Ok(true)
    }

    /// Frame callback feeding this relay
    ///
    /// Plug into [`CaptureSession::start`](crate::CaptureSession::start).
    /// Dropped frames are not errors.
    pub fn callback(self: &Arc<Self>) -> impl FnMut(FrameView<'_>) -> lamco_frame::Result<()> + Send + 'static {
        let relay = Arc::clone(self);
        move |frame: FrameView<'_>| relay.offer(&frame).map(|_| ())
    }

    /// Policy in effect
    pub fn policy(&self) -> RelayPolicy {
        self.policy
    }

    /// Check if the processor is handling a frame or one is pending
    pub fn is_busy(&self) -> bool {
        self.inner.state.lock().occupied()
    }

    /// Counters so far
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            relayed: self.inner.relayed.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting frames and join the processing thread
    ///
    /// The frame in flight, and a pending one, are processed first.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        self.inner.close();

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        // Last reference dropped from inside the handler
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!("Frame relay handler panicked");
        }

        let stats = self.stats();
        info!(
            "Frame relay shut down: {} relayed, {} dropped",
            stats.relayed, stats.dropped
        );
    }
}

impl Drop for FrameRelay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<H: FnMut(FrameBuffer)>(inner: Arc<Inner>, mut handler: H) {
    let _guard = WorkerGuard(Arc::clone(&inner));

    loop {
        let frame = {
            let mut state = inner.state.lock();
            state.busy = false;
            inner.slot_free.notify_all();

            inner
                .frame_ready
                .wait_while(&mut state, |s| s.pending.is_none() && !s.closed);

            match state.pending.take() {
                Some(frame) => {
                    state.busy = true;
                    frame
                }
                None => break,
            }
        };

        handler(frame);
        inner.relayed.fetch_add(1, Ordering::Relaxed);
    }
}
