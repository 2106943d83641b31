//=========================================================================
// Diagnostics
//=========================================================================
//
// Side channel for cancellation errors.
//
// Operations never raise their errors. When an operation is cancelled
// with an error, the error is handed to the operation's sink in addition
// to any registered callbacks.
//
// Sinks:
//   LogSink     → `log` facade (default)
//   ChannelSink → crossbeam channel, for a consumer on another thread
//   NullSink    → discards
//
//=========================================================================

//=== Module Declarations =================================================

mod channel_sink;

//=== Public API ==========================================================

pub use channel_sink::{ChannelSink, DiagnosticReport};

//=== External Dependencies ===============================================

use log::{error, warn};

//=== Internal Dependencies ===============================================

use crate::core::operation::{OperationError, Severity};

//=== DiagnosticSink Trait ================================================

/// Receives errors from cancelled operations.
///
/// Called once per cancellation that carries an error, after the
/// operation has reached `Cancelled` and before its callbacks fire.
pub trait DiagnosticSink {
    fn report(&self, label: &str, error: &OperationError);
}

//=== LogSink =============================================================

/// Forwards errors to the `log` facade, picking the level from severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, label: &str, err: &OperationError) {
        match err.severity() {
            Severity::Warning => warn!("Operation '{}' cancelled: {}", label, err.message()),
            Severity::Error => error!("Operation '{}' cancelled: {}", label, err.message()),
        }
    }
}

//=== NullSink ============================================================

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _label: &str, _error: &OperationError) {}
}

//=========================================================================
// Unit Tests
//=========================================================================
