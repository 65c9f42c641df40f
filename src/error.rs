//! Error types for vehicle telemetry processing.
//!
//! The track reconstruction core itself never fails: malformed transitions,
//! unknown pieces and pre-start noise are dropped and logged. Errors only come
//! from the layers around it, when decoding raw notifications, reading capture
//! or configuration files, and waiting on a mapping session.
//!
//! ## Error Categories
//!
//! - **File Errors**: Problems reading capture or configuration files
//! - **Parse Errors**: Truncated notifications or malformed capture lines
//! - **Config Errors**: Vehicle configuration that fails validation
//! - **Timeout Errors**: A mapping session did not complete in time
//! - **Connection Errors**: The notification source went away
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use overdrive::TrackError;
//!
//! let error = TrackError::connection_failed("vehicle disconnected");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TrackError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrackError {
    #[error("Vehicle connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid vehicle configuration: {reason}")]
    Config { reason: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("{channel} channel closed")]
    ChannelClosed { channel: String },
}

impl TrackError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TrackError::Connection { .. } => true,
            TrackError::Timeout { .. } => true,
            TrackError::File { .. } => false,
            TrackError::Parse { .. } => false,
            TrackError::Config { .. } => false,
            TrackError::ChannelClosed { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TrackError::Connection { .. } => vec![
                "Check the vehicle is charged and switched on",
                "Move the vehicle closer to the Bluetooth adapter",
                "Rescan for the vehicle and reconnect",
            ],
            TrackError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            TrackError::Parse { .. } => vec![
                "Verify the capture contains whole vehicle notifications",
                "Check firmware compatibility of the vehicle",
            ],
            TrackError::Config { .. } => vec![
                "Set car_id to the vehicle's Bluetooth identifier",
                "Use a start_lane between 1 and 4",
            ],
            TrackError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Check the vehicle is driving and crossing the start line",
                "Verify the track has a start/finish piece",
            ],
            TrackError::ChannelClosed { .. } => vec![
                "Keep the mapping session alive while sending notifications",
                "Restart the mapping session",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TrackError::File { path, source }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TrackError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TrackError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TrackError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        TrackError::Config { reason: reason.into() }
    }

    /// Helper constructor for closed channel errors.
    pub fn channel_closed(channel: impl Into<String>) -> Self {
        TrackError::ChannelClosed { channel: channel.into() }
    }
}

impl From<std::io::Error> for TrackError {
    fn from(err: std::io::Error) -> Self {
        TrackError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_carry_their_context(
                reason in ".*",
                context in "[a-z ]+",
                details in ".*",
                duration_ms in 1u64..60000u64
            ) {
                let connection = TrackError::connection_failed(reason.clone());
                prop_assert!(connection.to_string().contains(&reason));

                let parse = TrackError::parse_error(context.clone(), details.clone());
                let parse_msg = parse.to_string();
                prop_assert!(parse_msg.contains(&context));
                prop_assert!(parse_msg.contains(&details));

                let config = TrackError::config_error(reason.clone());
                prop_assert!(config.to_string().contains(&reason));

                let timeout = TrackError::Timeout { duration: Duration::from_millis(duration_ms) };
                prop_assert!(!timeout.to_string().is_empty());
            }

            #[test]
            fn io_errors_convert_to_file_errors(reason in ".*") {
                let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, reason.clone());
                let converted: TrackError = io_err.into();
                match converted {
                    TrackError::File { source, path } => {
                        prop_assert_eq!(source.to_string(), reason);
                        prop_assert_eq!(path, PathBuf::from("<unknown>"));
                    }
                    _ => prop_assert!(false, "Expected File error from io::Error conversion"),
                }
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TrackError>();

        let error = TrackError::connection_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let connection_error = TrackError::connection_failed("test");
        let parse_error = TrackError::parse_error("decode", "too short");
        let timeout_error = TrackError::Timeout { duration: Duration::from_secs(1) };

        assert!(connection_error.is_retryable());
        assert!(timeout_error.is_retryable());
        assert!(!parse_error.is_retryable());
        assert!(!TrackError::channel_closed("commands").is_retryable());

        for error in [&connection_error, &parse_error, &timeout_error] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn source_chain_is_preserved() {
        let inner = std::io::Error::other("adapter powered off");
        let error = TrackError::connection_failed_with_source("lost vehicle", Box::new(inner));

        let source = std::error::Error::source(&error).expect("source should be set");
        assert_eq!(source.to_string(), "adapter powered off");
    }
}
