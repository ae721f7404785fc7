//! Linear task pipeline: specs, argument resolution, output cache, and the
//! sequencing engine that drives one step per invocation.

pub mod cache;
pub mod outcome;
pub mod resolver;
pub mod sequencer;
pub mod spec;

pub use cache::{CacheEntry, CacheStore};
pub use outcome::{Outcome, OutcomeError};
pub use resolver::{resolve_map_path, resolve_path, resolve_paths, resolve_task_args};
pub use sequencer::{Sequencer, SequencerState};
pub use spec::{
    task_fn, PrevTaskDataAsArg, RequestArgs, TaskFailure, TaskFn, TaskReturnData, TaskSpec,
};
