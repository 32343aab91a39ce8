//! Error types for capture sessions
//!
//! Frame-level errors from `lamco-frame` are wrapped, and errors are
//! classified so callers can decide between retrying, reopening the device,
//! or giving up.

use lamco_frame::FrameError;
use thiserror::Error;

/// Errors that can occur while running a capture session
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Frame conversion or cloning failed
    #[error("Frame processing failed: {0}")]
    Frame(#[from] FrameError),

    /// The capture source reported a failure
    ///
    /// Opening the device, building the capture graph or pumping it failed.
    #[error("Capture source failed: {0}")]
    Source(String),

    /// The capture device went away while capturing
    #[error("Capture device lost")]
    DeviceLost,

    /// The capture thread did not exit within the bounded wait
    ///
    /// The stop request stays in effect and the session can be waited on
    /// again. The thread is never terminated forcibly.
    #[error("Capture thread did not stop within {waited_ms}ms")]
    StopTimeout {
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation not valid in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Spawning a worker thread failed
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

/// Result type for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

impl CaptureError {
    /// Create a source error
    pub fn source_failed(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Broad error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Bad input from the caller (format, layout, configuration)
    Caller,
    /// Memory or thread resources exhausted
    Resource,
    /// Device or capture graph failure
    Device,
    /// Session lifecycle (stop timeout, wrong state)
    Lifecycle,
}

/// Suggested reaction to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Fix the input; retrying unchanged fails again
    Abort,
    /// Retry the same operation later
    Retry,
    /// Tear the session down and start a new one
    RestartSession,
    /// Wait for the capture thread again
    WaitAgain,
}

/// Classify an error
pub fn classify_error(error: &CaptureError) -> ErrorType {
    match error {
        CaptureError::Frame(FrameError::OutOfMemory { .. }) | CaptureError::ThreadSpawn(_) => ErrorType::Resource,
        CaptureError::Frame(_) | CaptureError::InvalidConfig(_) => ErrorType::Caller,
        CaptureError::Source(_) | CaptureError::DeviceLost => ErrorType::Device,
        CaptureError::StopTimeout { .. } | CaptureError::InvalidState(_) => ErrorType::Lifecycle,
    }
}

/// Suggest how to recover from an error
pub fn recovery_action(error: &CaptureError) -> RecoveryAction {
    match error {
        CaptureError::StopTimeout { .. } => RecoveryAction::WaitAgain,
        CaptureError::Source(_) | CaptureError::DeviceLost => RecoveryAction::RestartSession,
        error if classify_error(error) == ErrorType::Resource => RecoveryAction::Retry,
        _ => RecoveryAction::Abort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CaptureError::StopTimeout { waited_ms: 250 };
        assert_eq!(err.to_string(), "Capture thread did not stop within 250ms");

        let err = CaptureError::source_failed("graph build failed");
        assert_eq!(err.to_string(), "Capture source failed: graph build failed");

        let err = CaptureError::from(FrameError::MalformedBuffer("short".to_string()));
        assert_eq!(err.to_string(), "Frame processing failed: Malformed frame buffer: short");
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(
            classify_error(&CaptureError::Frame(FrameError::UnsupportedFormat("Rgb24".into()))),
            ErrorType::Caller
        );
        assert_eq!(
            classify_error(&CaptureError::Frame(FrameError::OutOfMemory { requested: 8 })),
            ErrorType::Resource
        );
        assert_eq!(classify_error(&CaptureError::DeviceLost), ErrorType::Device);
        assert_eq!(
            classify_error(&CaptureError::StopTimeout { waited_ms: 1 }),
            ErrorType::Lifecycle
        );
    }

    #[test]
    fn test_recovery_action() {
        assert_eq!(
            recovery_action(&CaptureError::StopTimeout { waited_ms: 1 }),
            RecoveryAction::WaitAgain
        );
        assert_eq!(recovery_action(&CaptureError::DeviceLost), RecoveryAction::RestartSession);
        assert_eq!(
            recovery_action(&CaptureError::Frame(FrameError::OutOfMemory { requested: 8 })),
            RecoveryAction::Retry
        );
        assert_eq!(
            recovery_action(&CaptureError::InvalidConfig("poll".into())),
            RecoveryAction::Abort
        );
    }
}
