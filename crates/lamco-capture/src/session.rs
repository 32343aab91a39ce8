//! Capture session
//!
//! A [`CaptureSession`] owns one capture thread driving one
//! [`FrameSource`]. Frames reach the callback on that thread, in capture
//! order, one at a time. Failures and the end of the session are reported
//! on an event channel the caller can await.
//!
//! # Lifecycle
//!
//! ```text
//!  start()          signal_stop()         thread exits
//!    │                   │                     │
//!    ▼                   ▼                     ▼
//! Running ───────────▶ Stopping ───────────▶ Stopped
//!    │                                         ▲
//!    └──── end of stream / device lost / error ┘
//! ```
//!
//! Stopping is two-phase: [`CaptureSession::signal_stop`] only raises the
//! stop signal, [`CaptureSession::wait_for_stop`] waits a bounded time for
//! the thread to exit. A thread that overruns the wait is reported with
//! [`CaptureError::StopTimeout`] and stays joinable; it is never killed.
//!
//! # Examples
//!
//! ```rust
//! use lamco_capture::{CaptureConfig, CaptureSession, FinishReason, PatternSource};
//! use lamco_frame::PixelFormat;
//! use std::time::Duration;
//!
//! let source = PatternSource::new("pattern", 4, 2, PixelFormat::Rgb24)?.end_after(3);
//! let config = CaptureConfig::builder().poll_interval_ms(1).build();
//!
//! let mut session = CaptureSession::start(source, config, |frame| {
//!     assert_eq!(frame.width, 4);
//!     Ok(())
//! })?;
//!
//! let reason = session.wait_for_stop(Duration::from_secs(5))?;
//! assert_eq!(reason, FinishReason::EndOfStream);
//! assert_eq!(session.frames_received(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lamco_frame::{FrameError, FrameView};
use parking_lot::{Condvar, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::source::{FrameSink, FrameSource, SourceStatus};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Stop was requested by the owner
    StoppedByUser,
    /// The source ran out of frames
    EndOfStream,
    /// The device was disconnected
    DeviceLost,
    /// The source failed to open or while capturing
    SourceError,
}

impl FinishReason {
    /// User-facing description
    pub fn description(self) -> &'static str {
        match self {
            Self::StoppedByUser => "Video was stopped",
            Self::EndOfStream => "Video has finished",
            Self::DeviceLost => "Video device was unplugged",
            Self::SourceError => "Video has finished because of error in video source",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Asynchronous notifications from the capture thread
#[derive(Debug)]
pub enum CaptureEvent {
    /// The source failed or the device went away
    Error(CaptureError),
    /// A frame callback returned an error; capture continues
    CallbackFailed(FrameError),
    /// The capture thread is exiting
    ///
    /// Always the last event of a session, also when the source or the
    /// frame callback panicked.
    Finished(FinishReason),
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Capture thread is running
    Running,
    /// Stop was requested, thread has not exited yet
    Stopping,
    /// Capture thread has exited
    Stopped,
}

/// Boolean latch with timed waits
#[derive(Debug, Default)]
pub(crate) struct Signal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn set(&self) {
        *self.flag.lock() = true;
        self.cond.notify_all();
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.flag.lock()
    }

    /// Wait up to `timeout` for the latch, returns whether it is set
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let mut flag = self.flag.lock();
        if !*flag {
            self.cond.wait_while_for(&mut flag, |set| !*set, timeout);
        }
        *flag
    }
}

/// State shared between a session handle and its capture thread
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) stop: Signal,
    exited: Signal,
    pub(crate) frames_received: AtomicU64,
    pub(crate) bytes_received: AtomicU64,
}

/// Sets the exit latch when the capture thread unwinds or returns
///
/// On unwind it also sends the error and finish events the capture loop
/// never reached.
struct ExitGuard {
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<CaptureEvent>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Capture thread panicked");
            let _ = self
                .events
                .send(CaptureEvent::Error(CaptureError::source_failed("capture thread panicked")));
            let _ = self.events.send(CaptureEvent::Finished(FinishReason::SourceError));
        }
        self.shared.exited.set();
    }
}

/// Running capture session
///
/// Dropping a session requests stop and waits up to the configured stop
/// timeout.
pub struct CaptureSession {
    name: String,
    config: CaptureConfig,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<FinishReason>>,
    finish_reason: Option<FinishReason>,
    events: Option<mpsc::UnboundedReceiver<CaptureEvent>>,
}

impl CaptureSession {
    /// Start capturing from `source`
    ///
    /// `on_frame` runs on the capture thread for every frame. The view it
    /// receives is only valid during the call; use
    /// [`clone_frame`](lamco_frame::clone_frame) to keep a frame.
    pub fn start<S, F>(source: S, config: CaptureConfig, on_frame: F) -> Result<Self>
    where
        S: FrameSource,
        F: FnMut(FrameView<'_>) -> lamco_frame::Result<()> + Send + 'static,
    {
        config
            .validate()
            .map_err(|issues| CaptureError::InvalidConfig(issues.join("; ")))?;

        let name = source.name().to_string();
        let shared = Arc::new(Shared::default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let worker = CaptureWorker {
            shared: Arc::clone(&shared),
            events: events_tx,
            poll_interval: config.poll_interval(),
            convert_16bit: config.convert_16bit,
        };

        let handle = thread::Builder::new()
            .name(format!("{}-{}", config.thread_name, name))
            .spawn(move || worker.run(source, on_frame))?;

        info!("Capture session {} started", name);

        Ok(Self {
            name,
            config,
            shared,
            handle: Some(handle),
            finish_reason: None,
            events: Some(events_rx),
        })
    }

    /// Take the event receiver
    ///
    /// Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<CaptureEvent>> {
        self.events.take()
    }

    /// Request stop without waiting
    pub fn signal_stop(&self) {
        if !self.shared.stop.is_set() {
            debug!("Stop requested for capture session {}", self.name);
        }
        self.shared.stop.set();
    }

    /// Wait up to `timeout` for the capture thread to exit
    ///
    /// Does not request stop. Once the thread has been joined, later calls
    /// return the same reason immediately.
    ///
    /// # Errors
    ///
    /// [`CaptureError::StopTimeout`] if the thread is still running after
    /// `timeout`. The session stays intact and can be waited on again.
    pub fn wait_for_stop(&mut self, timeout: Duration) -> Result<FinishReason> {
        if let Some(reason) = self.finish_reason {
            return Ok(reason);
        }

        if !self.shared.exited.wait(timeout) {
            let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(
                "Capture session {} did not stop within {}ms",
                self.name, waited_ms
            );
            return Err(CaptureError::StopTimeout { waited_ms });
        }

        let handle = self
            .handle
            .take()
            .ok_or_else(|| CaptureError::invalid_state("capture thread already joined"))?;

        let reason = match handle.join() {
            Ok(reason) => reason,
            Err(_) => {
                error!("Capture thread for {} panicked", self.name);
                FinishReason::SourceError
            }
        };

        info!("Capture session {} stopped: {}", self.name, reason);
        self.finish_reason = Some(reason);
        Ok(reason)
    }

    /// Request stop and wait for the configured stop timeout
    pub fn stop(&mut self) -> Result<FinishReason> {
        self.signal_stop();
        self.wait_for_stop(self.config.stop_timeout())
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        if self.shared.exited.is_set() {
            SessionState::Stopped
        } else if self.shared.stop.is_set() {
            SessionState::Stopping
        } else {
            SessionState::Running
        }
    }

    /// Check if the capture thread is running and not asked to stop
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Frames received since the last call
    ///
    /// Counts every frame the source delivered, including those dropped
    /// after a stop request. Resets the counter.
    pub fn frames_received(&self) -> u64 {
        self.shared.frames_received.swap(0, Ordering::Relaxed)
    }

    /// Payload bytes received since the last call
    ///
    /// Each frame counts `width * height * bits_per_pixel / 8`, row padding
    /// excluded. Resets the counter.
    pub fn bytes_received(&self) -> u64 {
        self.shared.bytes_received.swap(0, Ordering::Relaxed)
    }

    /// Finish reason, once the capture thread has been joined
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// Source name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("finish_reason", &self.finish_reason)
            .finish_non_exhaustive()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        debug!("Dropping capture session {}", self.name);
        self.signal_stop();
        if let Err(e) = self.wait_for_stop(self.config.stop_timeout()) {
            warn!("Capture thread for {} left running: {}", self.name, e);
        }
    }
}

/// Capture thread body
struct CaptureWorker {
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<CaptureEvent>,
    poll_interval: Duration,
    convert_16bit: bool,
}

impl CaptureWorker {
    fn run<S, F>(self, mut source: S, mut on_frame: F) -> FinishReason
    where
        S: FrameSource,
        F: FnMut(FrameView<'_>) -> lamco_frame::Result<()>,
    {
        let _exit = ExitGuard {
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
        };

        let reason = self.capture(&mut source, &mut on_frame);
        source.close();
        debug!("Capture source {} closed", source.name());

        // Receiver may be gone
        let _ = self.events.send(CaptureEvent::Finished(reason));
        reason
    }

    fn capture<S, F>(&self, source: &mut S, on_frame: &mut F) -> FinishReason
    where
        S: FrameSource,
        F: FnMut(FrameView<'_>) -> lamco_frame::Result<()>,
    {
        if let Err(e) = source.open() {
            error!("Failed to open capture source {}: {}", source.name(), e);
            let _ = self.events.send(CaptureEvent::Error(e));
            return FinishReason::SourceError;
        }
        debug!("Capture source {} opened", source.name());

        loop {
            if self.shared.stop.is_set() {
                return FinishReason::StoppedByUser;
            }

            let status = {
                let mut sink = FrameSink::attached(&mut *on_frame, &self.shared, &self.events, self.convert_16bit);
                source.poll(&mut sink)
            };

            match status {
                Ok(SourceStatus::Running) => {}
                Ok(SourceStatus::EndOfStream) => {
                    debug!("Capture source {} reached end of stream", source.name());
                    return FinishReason::EndOfStream;
                }
                Ok(SourceStatus::DeviceLost) => {
                    warn!("Capture device {} was lost", source.name());
                    let _ = self.events.send(CaptureEvent::Error(CaptureError::DeviceLost));
                    return FinishReason::DeviceLost;
                }
                Err(e) => {
                    error!("Capture source {} failed: {}", source.name(), e);
                    let _ = self.events.send(CaptureEvent::Error(e));
                    return FinishReason::SourceError;
                }
            }

            if self.shared.stop.wait(self.poll_interval) {
                return FinishReason::StoppedByUser;
            }
        }
    }
}
