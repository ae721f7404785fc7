//! Error taxonomy for pipeline sequencing
//!
//! Only two things can fail a step: looking up the spec for the current index
//! and the task's own function. Unresolved argument paths are not errors —
//! they resolve to `Null` and flow through to the task. Every failure is
//! converted once, at the engine boundary, into the wire error shape.

use thiserror::Error;

use crate::pipeline::outcome::OutcomeError;
use crate::pipeline::spec::TaskFailure;

/// Wire status reported for every failed step.
pub const FAILURE_STATUS: u16 = 400;

/// Failures surfaced by the sequencing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    /// Task spec lookup by index failed (index beyond list bounds).
    #[error("no task spec at step index {index} (list has {total} entries)")]
    SpecLookup { index: usize, total: usize },

    /// The task's underlying function failed. Name and message are preserved
    /// verbatim, never reclassified.
    #[error("{name}: {message}")]
    TaskFailed { name: String, message: String },
}

impl SequencerError {
    /// Classification string carried in the wire error's `name` field.
    pub fn error_name(&self) -> &str {
        match self {
            SequencerError::SpecLookup { .. } => "SpecLookupError",
            SequencerError::TaskFailed { name, .. } => name,
        }
    }

    /// Convert into the uniform outcome error shape.
    pub fn to_outcome_error(&self) -> OutcomeError {
        let message = match self {
            SequencerError::SpecLookup { .. } => self.to_string(),
            SequencerError::TaskFailed { message, .. } => message.clone(),
        };

        OutcomeError {
            status: FAILURE_STATUS,
            name: self.error_name().to_string(),
            message,
        }
    }
}

impl From<TaskFailure> for SequencerError {
    fn from(failure: TaskFailure) -> Self {
        SequencerError::TaskFailed {
            name: failure.name,
            message: failure.message,
        }
    }
}

/// Result type for sequencer operations.
pub type SequencerResult<T> = Result<T, SequencerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lookup_maps_to_wire_error() {
        let error = SequencerError::SpecLookup { index: 0, total: 0 };
        let wire = error.to_outcome_error();

        assert_eq!(wire.status, 400);
        assert_eq!(wire.name, "SpecLookupError");
        assert!(wire.message.contains("step index 0"));
        assert!(wire.message.contains("0 entries"));
    }

    #[test]
    fn test_task_failure_preserved_verbatim() {
        let failure = TaskFailure::new("TimeoutError", "upstream timed out after 30s");
        let error = SequencerError::from(failure);
        let wire = error.to_outcome_error();

        assert_eq!(wire.status, 400);
        assert_eq!(wire.name, "TimeoutError");
        assert_eq!(wire.message, "upstream timed out after 30s");
    }

    #[test]
    fn test_error_display() {
        let error = SequencerError::TaskFailed {
            name: "LookupError".to_string(),
            message: "missing record".to_string(),
        };
        assert_eq!(error.to_string(), "LookupError: missing record");
    }
}
