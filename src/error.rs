//! Error types used by the logvisor host, bus, and plugins.
//!
//! This module defines the error enums for each seam of the pipeline:
//!
//! - [`HostError`]: errors raised by the dispatch host itself.
//! - [`BusError`]: errors raised by the line bus.
//! - [`SubscriptionError`]: abnormal endings of a single subscription.
//! - [`PluginError`]: errors raised by plugin implementations.
//! - [`PublishError`]: errors raised by test-run publishers.
//!
//! The types provide helper methods (`as_label`, `as_message`) for
//! logging/telemetry.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the dispatch host.
///
/// These represent failures of the host's own shutdown sequence,
/// such as the drain phase exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HostError {
    /// Drain grace period was exceeded; some plugins still had work in flight.
    #[error("drain grace {grace:?} exceeded; still busy: {stuck:?}")]
    DrainGraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of plugins that had not drained or finalized in time.
        stuck: Vec<String>,
    },
}

impl HostError {
    /// Returns a short stable label (snake_case) for use in logs/telemetry.
    ///
    /// # Example
    /// ```
    /// use logvisor::HostError;
    /// use std::time::Duration;
    ///
    /// let err = HostError::DrainGraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "host_drain_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HostError::DrainGraceExceeded { .. } => "host_drain_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HostError::DrainGraceExceeded { grace, stuck } => {
                format!("drain grace exceeded after {grace:?}; busy plugins={stuck:?}")
            }
        }
    }
}

/// # Errors produced by the line bus.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// `publish` was called after `complete`; the line was not delivered.
    #[error("bus already completed")]
    Completed,

    /// A subscription ended abnormally; reported once by `complete`.
    #[error("subscription '{subscription}' ended abnormally: {source}")]
    Subscription {
        /// Name of the handler whose subscription ended.
        subscription: String,
        /// What ended it.
        #[source]
        source: SubscriptionError,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Completed => "bus_completed",
            BusError::Subscription { .. } => "bus_subscription_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::Completed => "publish after complete".to_string(),
            BusError::Subscription {
                subscription,
                source,
            } => format!("subscription '{subscription}': {source}"),
        }
    }
}

/// # Abnormal endings of a single bus subscription.
///
/// Either outcome stops that subscription's delivery loop; sibling
/// subscriptions keep running.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// Handler returned an error for a line.
    #[error("handler failed: {error}")]
    HandlerFailed {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked; the panic was caught by the delivery worker.
    #[error("handler panicked: {info}")]
    HandlerPanicked {
        /// Panic payload, downcast to a string where possible.
        info: String,
    },
}

impl SubscriptionError {
    /// Returns a short stable label (snake_case) for use in logs/telemetry.
    ///
    /// # Example
    /// ```
    /// use logvisor::SubscriptionError;
    ///
    /// let err = SubscriptionError::HandlerPanicked { info: "boom".into() };
    /// assert_eq!(err.as_label(), "handler_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscriptionError::HandlerFailed { .. } => "handler_failed",
            SubscriptionError::HandlerPanicked { .. } => "handler_panicked",
        }
    }
}

/// # Errors produced by plugin implementations.
///
/// One variant per lifecycle phase; the host logs these and keeps running
/// (an erroring plugin never takes the stream down with it).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PluginError {
    /// Plugin could not set itself up; it is excluded from the run.
    #[error("initialization failed: {error}")]
    Init {
        /// The underlying error message.
        error: String,
    },

    /// Plugin failed to process a single line; delivery continues.
    #[error("line processing failed: {error}")]
    Process {
        /// The underlying error message.
        error: String,
    },

    /// Plugin failed its end-of-stream cleanup.
    #[error("finalize failed: {error}")]
    Finalize {
        /// The underlying error message.
        error: String,
    },
}

impl PluginError {
    /// Returns a short stable label (snake_case) for use in logs/telemetry.
    ///
    /// # Example
    /// ```
    /// use logvisor::PluginError;
    ///
    /// let err = PluginError::Init { error: "no parsers".into() };
    /// assert_eq!(err.as_label(), "plugin_init_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::Init { .. } => "plugin_init_failed",
            PluginError::Process { .. } => "plugin_process_failed",
            PluginError::Finalize { .. } => "plugin_finalize_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PluginError::Init { error } => format!("init: {error}"),
            PluginError::Process { error } => format!("process: {error}"),
            PluginError::Finalize { error } => format!("finalize: {error}"),
        }
    }
}

/// # Errors produced by test-run publishers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The upload failed; the run is logged and dropped (no retry in core).
    #[error("upload failed: {error}")]
    Upload {
        /// The underlying error message.
        error: String,
    },
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Upload { .. } => "publish_upload_failed",
        }
    }
}
