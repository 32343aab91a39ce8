//! Capture Configuration
//!
//! Provides configuration options for capture sessions with a builder pattern
//! for ergonomic construction.
//!
//! # Examples
//!
//! ```rust
//! use lamco_capture::{CaptureConfig, RelayPolicy};
//!
//! // Using builder pattern
//! let config = CaptureConfig::builder()
//!     .poll_interval_ms(50)
//!     .stop_timeout_ms(2000)
//!     .relay_policy(RelayPolicy::SkipIfBusy)
//!     .build();
//!
//! // Using struct literal with defaults
//! let config = CaptureConfig {
//!     convert_16bit: true,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use crate::relay::RelayPolicy;

/// Configuration for capture sessions
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// How often the capture thread checks for a stop request (default: 100)
    ///
    /// Also the pause between two polls of the frame source. A stop request is
    /// noticed at most this long after it was made, plus the time the source
    /// spends in one poll.
    pub poll_interval_ms: u64,

    /// Bounded wait for the capture thread to exit on stop (default: 5000)
    ///
    /// Exceeding it is reported as [`CaptureError::StopTimeout`](crate::CaptureError::StopTimeout).
    pub stop_timeout_ms: u64,

    /// Prefix for capture thread names (default: "lamco-capture")
    ///
    /// The source name is appended.
    pub thread_name: String,

    /// What a [`FrameRelay`](crate::FrameRelay) does with a frame that arrives
    /// while the previous one is still being processed (default: Wait)
    ///
    /// Applied by [`FrameRelay::from_config`](crate::FrameRelay::from_config).
    pub relay_policy: RelayPolicy,

    /// Narrow 16-bit-per-channel frames to 8 bits before the frame callback sees them (default: false)
    pub convert_16bit: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            stop_timeout_ms: 5000,
            thread_name: "lamco-capture".to_string(),
            relay_policy: RelayPolicy::Wait,
            convert_16bit: false,
        }
    }
}

impl CaptureConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Stop timeout as a duration
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Validate configuration and return any issues
    ///
    /// Returns `Ok(())` if configuration is valid, or a list of issues.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.poll_interval_ms == 0 {
            issues.push("poll_interval_ms must be at least 1".to_string());
        }

        if self.poll_interval_ms > 10_000 {
            issues.push("poll_interval_ms should not exceed 10000".to_string());
        }

        if self.stop_timeout_ms < self.poll_interval_ms {
            issues.push("stop_timeout_ms must be at least poll_interval_ms".to_string());
        }

        if self.thread_name.is_empty() {
            issues.push("thread_name cannot be empty".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Builder for [`CaptureConfig`]
#[derive(Debug, Clone, Default)]
pub struct CaptureConfigBuilder {
    poll_interval_ms: Option<u64>,
    stop_timeout_ms: Option<u64>,
    thread_name: Option<String>,
    relay_policy: Option<RelayPolicy>,
    convert_16bit: Option<bool>,
}

impl CaptureConfigBuilder {
    /// Set stop-signal poll interval in milliseconds
    #[must_use]
    pub fn poll_interval_ms(mut self, interval: u64) -> Self {
        self.poll_interval_ms = Some(interval);
        self
    }

    /// Set bounded stop wait in milliseconds
    #[must_use]
    pub fn stop_timeout_ms(mut self, timeout: u64) -> Self {
        self.stop_timeout_ms = Some(timeout);
        self
    }

    /// Set capture thread name prefix
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Set relay policy
    #[must_use]
    pub fn relay_policy(mut self, policy: RelayPolicy) -> Self {
        self.relay_policy = Some(policy);
        self
    }

    /// Set whether 16-bit frames are narrowed before delivery
    #[must_use]
    pub fn convert_16bit(mut self, enable: bool) -> Self {
        self.convert_16bit = Some(enable);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> CaptureConfig {
        let defaults = CaptureConfig::default();

        CaptureConfig {
            poll_interval_ms: self.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            stop_timeout_ms: self.stop_timeout_ms.unwrap_or(defaults.stop_timeout_ms),
            thread_name: self.thread_name.unwrap_or(defaults.thread_name),
            relay_policy: self.relay_policy.unwrap_or(defaults.relay_policy),
            convert_16bit: self.convert_16bit.unwrap_or(defaults.convert_16bit),
        }
    }
}
