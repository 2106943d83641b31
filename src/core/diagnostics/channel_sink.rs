//=========================================================================
// Channel Sink
//=========================================================================
//
// Diagnostic sink that forwards reports over a crossbeam channel.
//
// Architecture:
//   Operation::cancel() → ChannelSink::report() → Sender<DiagnosticReport>
//                                                   ↓
//                         consumer (any thread) ← Receiver<DiagnosticReport>
//
// Sending never blocks. A full or disconnected channel drops the report
// and logs a warning instead.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Sender, TrySendError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::DiagnosticSink;
use crate::core::operation::OperationError;

//=== DiagnosticReport ====================================================

/// One cancellation error, tagged with the operation label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub label: String,
    pub error: OperationError,
}

//=== ChannelSink =========================================================

/// Sends every report to a crossbeam channel.
pub struct ChannelSink {
    sender: Sender<DiagnosticReport>,
}

impl ChannelSink {
    pub fn new(sender: Sender<DiagnosticReport>) -> Self {
        Self { sender }
    }
}

impl DiagnosticSink for ChannelSink {
    fn report(&self, label: &str, error: &OperationError) {
        let report = DiagnosticReport {
            label: label.to_owned(),
            error: error.clone(),
        };

        match self.sender.try_send(report) {
            Ok(()) => {}
            Err(TrySendError::Full(report)) => {
                warn!("Diagnostic channel full, dropping report for '{}'", report.label);
            }
            Err(TrySendError::Disconnected(report)) => {
                warn!("Diagnostic channel disconnected, dropping report for '{}'", report.label);
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
