//! Error types for the call adapter domain.
//!
//! [`CallError`] is what a listener or a synchronous caller sees when a call
//! does not produce a response. [`ConfigurationError`] covers problems detected
//! while selecting or configuring an adapter for a call site; these are raised
//! at construction time and never deferred to a running call.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Call-level errors
// ---------------------------------------------------------------------------

/// Errors delivered to a [`crate::CompletionListener`] or returned from a
/// synchronous [`crate::AsyncCall::execute`].
///
/// Delegate-originated variants pass through the adapter unchanged. The only
/// variant the adapter itself synthesises on the asynchronous path is
/// [`CallError::Canceled`], which replaces a success that was overtaken by
/// cancellation before it could be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The call was canceled before its outcome was delivered.
    #[error("Canceled")]
    Canceled,

    /// The underlying transport reported a failure.
    #[error("Transport failure: {message}")]
    Transport {
        /// Transport-supplied description of the failure.
        message: String,
    },

    /// A required argument was missing or malformed.
    ///
    /// Produced by: `enqueue` without a listener. Raised before any work is
    /// scheduled.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Which argument was rejected and why.
        message: String,
    },

    /// The call has already been started, either synchronously or via `enqueue`.
    #[error("Already executed")]
    AlreadyExecuted,
}

impl CallError {
    /// Convenience constructor for [`CallError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns `true` if this error represents a cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

// ---------------------------------------------------------------------------
// Construction-time errors
// ---------------------------------------------------------------------------

/// Errors raised while selecting, configuring, or loading configuration for a
/// call adapter.
///
/// Every variant is fatal for the call site it concerns: the call site is never
/// built with an invalid adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A rebind marker was attached to a call site whose return shape is not a call.
    #[error("Rebind marker must be used with a Call return type, found '{found}'")]
    IncompatibleReturnShape {
        /// Name of the return type actually declared.
        found: String,
    },

    /// The call site returns a call, but without a response type parameter.
    #[error("Call return type must be parameterized with a response type")]
    UnparameterizedCall,

    /// More than one rebind marker was attached to a single call site.
    #[error("Expected at most one rebind marker per call site, found {count}")]
    DuplicateMarker {
        /// Number of rebind markers found.
        count: usize,
    },

    /// Adapter configuration could not be parsed.
    #[error("Invalid adapter configuration: {message}")]
    InvalidConfig {
        /// Parser-supplied description of the problem.
        message: String,
    },

    /// A name that must be non-empty was empty.
    #[error("Empty name for '{field}'")]
    EmptyName {
        /// The configuration field that carried the empty name.
        field: &'static str,
    },
}
