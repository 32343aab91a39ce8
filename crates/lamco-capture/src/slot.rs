//! Session replacement
//!
//! A [`SessionSlot`] holds at most one live [`CaptureSession`]. Switching
//! devices goes through [`SessionSlot::replace`], which stops and joins the
//! old session before the new one starts, so two capture threads never run
//! for the same slot.

use lamco_frame::FrameView;
use tracing::{debug, info};

use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::session::{CaptureSession, FinishReason};
use crate::source::FrameSource;

/// Owner of at most one capture session
#[derive(Debug)]
pub struct SessionSlot {
    config: CaptureConfig,
    current: Option<CaptureSession>,
}

impl SessionSlot {
    /// Create an empty slot; every session it starts uses `config`
    pub fn new(config: CaptureConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|issues| CaptureError::InvalidConfig(issues.join("; ")))?;
        Ok(Self { config, current: None })
    }

    /// Stop the current session, if any, then start a new one
    ///
    /// Returns how the previous session finished.
    ///
    /// # Errors
    ///
    /// [`CaptureError::StopTimeout`] if the previous session did not stop
    /// within the stop timeout. The previous session is kept and the new
    /// source is not started.
    pub fn replace<S, F>(&mut self, source: S, on_frame: F) -> Result<Option<FinishReason>>
    where
        S: FrameSource,
        F: FnMut(FrameView<'_>) -> lamco_frame::Result<()> + Send + 'static,
    {
        let previous = self.stop()?;
        if let Some(reason) = previous {
            debug!("Previous session finished: {}", reason);
        }

        let session = CaptureSession::start(source, self.config.clone(), on_frame)?;
        info!("Session slot now running {}", session.name());
        self.current = Some(session);
        Ok(previous)
    }

    /// Stop and release the current session
    ///
    /// On timeout the session stays in the slot.
    pub fn stop(&mut self) -> Result<Option<FinishReason>> {
        let Some(session) = self.current.as_mut() else {
            return Ok(None);
        };
        let reason = session.stop()?;
        self.current = None;
        Ok(Some(reason))
    }

    /// Remove the current session without stopping it
    pub fn take(&mut self) -> Option<CaptureSession> {
        self.current.take()
    }

    /// Current session
    pub fn current(&self) -> Option<&CaptureSession> {
        self.current.as_ref()
    }

    /// Current session, mutable
    pub fn current_mut(&mut self) -> Option<&mut CaptureSession> {
        self.current.as_mut()
    }

    /// Check if the slot holds a session that is still running
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(CaptureSession::is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSource;
    use lamco_frame::PixelFormat;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> CaptureConfig {
        CaptureConfig::builder().poll_interval_ms(1).stop_timeout_ms(2000).build()
    }

    #[test]
    fn test_empty_slot() {
        let mut slot = SessionSlot::new(config()).expect("slot");
        assert!(!slot.is_active());
        assert!(slot.current().is_none());
        assert_eq!(slot.stop().expect("stop"), None);
    }

    #[test]
    fn test_invalid_config() {
        let bad = CaptureConfig {
            thread_name: String::new(),
            ..config()
        };
        assert!(matches!(SessionSlot::new(bad), Err(CaptureError::InvalidConfig(_))));
    }

    #[test]
    fn test_replace_stops_previous() {
        let mut slot = SessionSlot::new(config()).expect("slot");

        let first = PatternSource::new("first", 2, 2, PixelFormat::Gray8).expect("pattern");
        assert_eq!(slot.replace(first, |_| Ok(())).expect("start first"), None);
        assert!(slot.is_active());

        let second = PatternSource::new("second", 2, 2, PixelFormat::Gray8).expect("pattern");
        let previous = slot.replace(second, |_| Ok(())).expect("start second");
        assert_eq!(previous, Some(FinishReason::StoppedByUser));
        assert_eq!(slot.current().map(CaptureSession::name), Some("second"));

        assert_eq!(slot.stop().expect("stop"), Some(FinishReason::StoppedByUser));
        assert!(!slot.is_active());
    }

    #[test]
    fn test_replace_keeps_session_on_stop_timeout() {
        let config = CaptureConfig::builder().poll_interval_ms(1).stop_timeout_ms(10).build();
        let mut slot = SessionSlot::new(config).expect("slot");

        // Each poll blocks far longer than the stop timeout
        let slow = PatternSource::new("slow", 2, 2, PixelFormat::Gray8)
            .expect("pattern")
            .with_poll_delay(Duration::from_millis(300));
        slot.replace(slow, |_| Ok(())).expect("start slow");

        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let next = PatternSource::new("next", 2, 2, PixelFormat::Gray8).expect("pattern");
        let result = slot.replace(next, move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert!(matches!(result, Err(CaptureError::StopTimeout { waited_ms: 10 })));
        assert_eq!(slot.current().map(CaptureSession::name), Some("slow"));

        // The old thread still finishes and the slot can be cleared
        let session = slot.current_mut().expect("old session kept");
        assert_eq!(
            session.wait_for_stop(Duration::from_secs(5)).expect("slow stops"),
            FinishReason::StoppedByUser
        );
        assert_eq!(slot.stop().expect("stop"), Some(FinishReason::StoppedByUser));
        assert!(slot.current().is_none());
        assert!(!started.load(Ordering::SeqCst));
    }
}
