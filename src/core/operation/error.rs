//=========================================================================
// Operation Error
//=========================================================================
//
// Immutable value describing why an operation was cancelled.
//
// Errors are never raised across the framework boundary. They travel as
// data on the cancelled operation and are handed to callbacks and the
// diagnostic sink.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use thiserror::Error;

//=== Severity ============================================================

/// How serious a cancellation error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

//=== OperationError ======================================================

/// Message and severity attached to a cancelled operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{severity}: {message}")]
pub struct OperationError {
    message: String,
    severity: Severity,
}

impl OperationError {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Shorthand for a `Severity::Warning` error.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    /// Shorthand for a `Severity::Error` error.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_severity() {
        assert_eq!(OperationError::warning("w").severity(), Severity::Warning);
        assert_eq!(OperationError::error("e").severity(), Severity::Error);
    }

    #[test]
    fn display_includes_severity_and_message() {
        let err = OperationError::error("asset missing");
        assert_eq!(err.to_string(), "error: asset missing");
        assert_eq!(err.message(), "asset missing");
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(OperationError::warning("slow"));
        assert_eq!(err.to_string(), "warning: slow");
    }
}
