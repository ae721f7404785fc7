//! taskpipe - Linear task sequencing with cached data handoff
//!
//! A small engine for running an ordered list of asynchronous tasks, one step
//! per invocation, threading data from earlier tasks into later ones and
//! returning a uniform `{data, error, taskId}` outcome on every call.
//!
//! # Overview
//!
//! This crate provides:
//! - Declarative task specifications with argument sourcing from the original
//!   request payload and/or cached outputs of prior tasks
//! - A stateful sequencer executing at most one task per invocation, with an
//!   advisory in-flight flag guarding against re-triggering
//! - A conditional output cache with first-match-wins reads
//! - An HTTP adapter mapping outcomes onto status codes and bodies
//!
//! # Quick Start
//!
//! ```rust
//! use taskpipe::pipeline::{task_fn, Sequencer, TaskSpec};
//! use serde_json::json;
//!
//! // Step 1 loads a record and caches it; step 2 consumes the cached value.
//! let specs = vec![
//!     TaskSpec::new(1, "load-record", task_fn(|args| async move {
//!         Ok(json!({"record": {"id": args.first().cloned()}}))
//!     }))
//!     .with_request_args(["recordId"])
//!     .with_cached_output(),
//!     TaskSpec::new(2, "summarize", task_fn(|args| async move {
//!         Ok(json!({"summary": args}))
//!     }))
//!     .with_prev_task_data(1, ["record"]),
//! ];
//!
//! // One sequencer owns the progress state for this spec list; callers
//! // invoke it repeatedly until the final task's data is delivered.
//! let sequencer = Sequencer::new();
//! assert_eq!(sequencer.state().current_task_id, 1);
//! assert_eq!(specs.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod server;

pub use config::{ConfigError, PipelineConfig};
pub use error::{SequencerError, SequencerResult, FAILURE_STATUS};
pub use pipeline::{
    task_fn, CacheStore, Outcome, OutcomeError, Sequencer, SequencerState, TaskFailure, TaskFn,
    TaskSpec,
};
pub use server::{outcome_reply, remap_request_args, PipelineServer};
