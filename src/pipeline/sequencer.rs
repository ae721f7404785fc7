//! The task-sequencing engine
//!
//! Drives one step of pipeline progress per invocation and reports
//! cumulative state through the uniform [`Outcome`] shape. Callers invoke
//! repeatedly (poll) until the final task completes and the sequencer resets.
//!
//! Progress state is owned by one `Sequencer` instance, so independent
//! pipelines never interfere. The in-flight flag is a cooperative advisory
//! lock: an invocation that observes the current step already executing
//! returns a snapshot instead of re-triggering the task. It does not notify
//! waiters; callers that need the final data must poll.

use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, Instrument};

use crate::error::SequencerError;
use crate::pipeline::cache::CacheStore;
use crate::pipeline::outcome::Outcome;
use crate::pipeline::resolver::resolve_task_args;
use crate::pipeline::spec::{TaskFn, TaskSpec};
use crate::task_span;

/// Mutable progress record for one pipeline instance.
///
/// `current_task_id` runs from 1 to `total`, then to the `total + 1` sentinel
/// once the final task has executed but the reset transition has not yet run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerState {
    pub step_index: usize,
    pub current_task_id: u64,
    pub in_flight: bool,
}

impl SequencerState {
    pub fn new() -> Self {
        Self {
            step_index: 0,
            current_task_id: 1,
            in_flight: false,
        }
    }

    /// Return to the initial values for the next pipeline cycle.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}

/// State guarded by the sequencer's mutex.
struct Inner {
    state: SequencerState,
    cache: CacheStore,
    /// Data delivered by the last completed pipeline, `{}` before any.
    data: Value,
    /// Task id last reported on a success path; error outcomes reuse it.
    last_task_id: u64,
}

/// What one invocation decided to do while holding the lock.
enum Planned {
    /// Nothing to execute this call; the outcome is already assembled.
    Done(Outcome),
    Execute(ExecutionPlan),
}

struct ExecutionPlan {
    task: Arc<dyn TaskFn>,
    args: Vec<Value>,
    task_id: u64,
    task_name: String,
    cache_output: bool,
    is_final: bool,
}

/// Stateful engine executing one [`TaskSpec`] list step by step.
pub struct Sequencer {
    inner: Mutex<Inner>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SequencerState::new(),
                cache: CacheStore::new(),
                data: json!({}),
                last_task_id: 0,
            }),
        }
    }

    /// Snapshot of the current progress state.
    pub fn state(&self) -> SequencerState {
        self.lock().state
    }

    /// Number of cached task outputs currently retained.
    pub fn cache_size(&self) -> usize {
        self.lock().cache.len()
    }

    /// Drive one step of the pipeline.
    ///
    /// At most one underlying task executes per call. The lock is only held
    /// while planning and committing, never across the task's await point, so
    /// a concurrent invocation observes the in-flight flag and no-ops.
    pub async fn invoke(&self, request_args: &Map<String, Value>, specs: &[TaskSpec]) -> Outcome {
        let plan = {
            let mut inner = self.lock();
            match Self::plan(&mut inner, request_args, specs) {
                Ok(planned) => planned,
                Err(err) => return Self::fail(&mut inner, err),
            }
        };

        let mut plan = match plan {
            Planned::Done(outcome) => return outcome,
            Planned::Execute(plan) => plan,
        };

        info!(
            task_id = plan.task_id,
            task_name = %plan.task_name,
            "running task"
        );

        let span = task_span!(task_id = plan.task_id, task_name = %plan.task_name);
        let args = std::mem::take(&mut plan.args);
        let result = plan.task.call(args).instrument(span).await;

        let mut inner = self.lock();
        match result {
            Ok(value) => Self::commit(&mut inner, &plan, value, specs.len() as u64),
            Err(failure) => Self::fail(&mut inner, SequencerError::from(failure)),
        }
    }

    /// Decide this invocation's action while holding the lock.
    fn plan(
        inner: &mut Inner,
        request_args: &Map<String, Value>,
        specs: &[TaskSpec],
    ) -> Result<Planned, SequencerError> {
        let total = specs.len() as u64;
        let state = inner.state;

        let spec = specs
            .get(state.step_index)
            .ok_or(SequencerError::SpecLookup {
                index: state.step_index,
                total: specs.len(),
            })?;
        let args = resolve_task_args(spec, request_args, &inner.cache);

        if state.current_task_id < total {
            // Advance branch: every task except the last one.
            if state.current_task_id == spec.task_id && state.in_flight {
                debug!(
                    task_id = state.current_task_id,
                    "step already in flight; returning snapshot"
                );
                return Ok(Planned::Done(Self::snapshot(inner)));
            }
            if state.current_task_id == spec.task_id {
                inner.state.in_flight = true;
                return Ok(Planned::Execute(ExecutionPlan {
                    task: Arc::clone(&spec.task),
                    args,
                    task_id: spec.task_id,
                    task_name: spec.task_name.clone(),
                    cache_output: spec.caches_output(),
                    is_final: false,
                }));
            }
            // Task counter out of step with the spec list; nothing to run.
            return Ok(Planned::Done(Self::snapshot(inner)));
        }

        if state.current_task_id == total && state.in_flight {
            debug!(
                task_id = state.current_task_id,
                "final step already in flight; returning snapshot"
            );
            return Ok(Planned::Done(Self::snapshot(inner)));
        }

        if state.current_task_id == total {
            inner.state.in_flight = true;
            return Ok(Planned::Execute(ExecutionPlan {
                task: Arc::clone(&spec.task),
                args,
                task_id: spec.task_id,
                task_name: spec.task_name.clone(),
                cache_output: spec.caches_output(),
                is_final: true,
            }));
        }

        if state.current_task_id == total + 1
            && state.in_flight
            && state.step_index + 1 == specs.len()
        {
            // Completion transition: final output was delivered on the
            // previous call, start the next cycle from step 0.
            info!("pipeline complete; resetting sequencer state");
            inner.state.reset();
            inner.cache.clear();
            return Ok(Planned::Done(Self::snapshot(inner)));
        }

        Ok(Planned::Done(Self::snapshot(inner)))
    }

    /// Apply a successful execution's state transition.
    fn commit(inner: &mut Inner, plan: &ExecutionPlan, value: Value, total: u64) -> Outcome {
        if plan.is_final {
            inner.data = value;
            // Sentinel: final task executed, reset pending on the next call.
            // The in-flight flag stays set until that transition runs.
            inner.state.current_task_id = total + 1;
        } else {
            if plan.cache_output {
                debug!(task_id = plan.task_id, "caching task output");
                inner.cache.set(plan.task_id, value);
            }
            inner.state.step_index += 1;
            inner.state.current_task_id += 1;
            inner.state.in_flight = false;
        }

        Self::snapshot(inner)
    }

    /// Convert a failure into the uniform outcome and reset everything.
    ///
    /// A failed run never leaves the pipeline partially advanced: the next
    /// invocation starts the whole list from step 0.
    fn fail(inner: &mut Inner, err: SequencerError) -> Outcome {
        error!(error = %err, "pipeline step failed; resetting sequencer");

        let wire_error = err.to_outcome_error();
        inner.state.reset();
        inner.cache.clear();

        Outcome::failure(inner.data.clone(), wire_error, inner.last_task_id)
    }

    /// Assemble a success outcome from the current state.
    fn snapshot(inner: &mut Inner) -> Outcome {
        inner.last_task_id = inner.state.current_task_id;
        Outcome::success(inner.data.clone(), inner.state.current_task_id)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic inside the short critical sections leaves consistent
        // enough state to keep serving; recover the guard from poisoning.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}
