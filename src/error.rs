//! Error types for the volume descriptor translation layer
//!
//! Provides structured error types for translator dispatch, locator parsing,
//! and schema mapping. Every failure here is terminal and synchronous: nothing
//! in this crate retries, logs-and-swallows, or aborts the process.

use thiserror::Error;

/// Unified error type for descriptor translation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Source Selection Errors
    // =========================================================================
    /// The descriptor does not carry the provider source the translator
    /// requires.
    #[error("{plugin} source not defined on {descriptor}")]
    UnsupportedSource {
        descriptor: &'static str,
        plugin: &'static str,
    },

    // =========================================================================
    // Locator Parsing Errors
    // =========================================================================
    /// A disk locator string matched none of the known shapes. The message
    /// carries both the offending input and the pattern that was expected so
    /// callers can surface an actionable diagnostic.
    #[error("could not get disk name from {locator}, correct format: {expected_format}")]
    MalformedLocator {
        locator: String,
        expected_format: String,
    },

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    /// A CSI descriptor reached a translator registered for another driver.
    #[error("driver {driver} is not handled by the {expected} translator")]
    UnsupportedDriver {
        driver: String,
        expected: &'static str,
    },

    /// The dispatcher exhausted its registry without a predicate match.
    #[error("no in-tree plugin translation logic found for {descriptor}")]
    NoTranslatorFound { descriptor: String },

    // =========================================================================
    // Development-Time Gaps
    // =========================================================================
    /// The translator exists but the requested operation has no
    /// implementation yet. A reportable error value, never a panic, so
    /// callers and test suites can distinguish "not yet built" from
    /// malformed input.
    #[error("{plugin} has no implementation for {operation}")]
    NotImplemented {
        plugin: &'static str,
        operation: &'static str,
    },
}

impl Error {
    /// Check if this error stems from the caller's input rather than from a
    /// gap in a translator implementation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedSource { .. }
                | Error::MalformedLocator { .. }
                | Error::UnsupportedDriver { .. }
        )
    }

    /// Check if this error marks an operation that has not been built yet.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented { .. })
    }

    /// Translation errors are terminal; kept for callers that branch on
    /// retryability across error types.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for descriptor translation
pub type Result<T> = std::result::Result<T, Error>;
