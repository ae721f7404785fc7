//! Uniform outcome shape returned by every sequencer invocation
//!
//! Every call into the engine, success or failure, produces the same
//! `{data, error, taskId}` envelope so transport adapters never have to
//! special-case partial responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error descriptor carried inside an [`Outcome`].
///
/// A `status` of 0 means "no error"; any positive value is the HTTP-style
/// status an adapter should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub status: u16,
    pub name: String,
    pub message: String,
}

impl OutcomeError {
    /// The "no error" marker used on every success path.
    pub fn none() -> Self {
        Self {
            status: 0,
            name: String::new(),
            message: String::new(),
        }
    }

    /// Whether this descriptor carries an actual error.
    pub fn is_error(&self) -> bool {
        self.status > 0
    }
}

/// Result envelope for one sequencer invocation.
///
/// Serialized with camelCase field names (`taskId`) to keep the wire shape
/// stable for HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Data delivered by the pipeline's final task, `{}` until one completes.
    pub data: Value,
    /// Error descriptor; `status == 0` on success paths.
    pub error: OutcomeError,
    /// The sequencer's task identifier after this invocation's step.
    pub task_id: u64,
}

impl Outcome {
    /// Assemble a success outcome. All fields are always populated.
    pub fn success(data: Value, task_id: u64) -> Self {
        Self {
            data,
            error: OutcomeError::none(),
            task_id,
        }
    }

    /// Assemble a failure outcome, keeping whatever data was last delivered.
    pub fn failure(data: Value, error: OutcomeError, task_id: u64) -> Self {
        Self {
            data,
            error,
            task_id,
        }
    }
}
