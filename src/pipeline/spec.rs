//! Task specifications: one declarative step of a pipeline
//!
//! A [`TaskSpec`] couples an asynchronous unit of work with its argument
//! sourcing rules (from the original request, from a prior task's cached
//! output, or both) and an optional output-caching flag.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a task's underlying function.
///
/// `name` and `message` are surfaced to callers verbatim; the engine never
/// reclassifies them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct TaskFailure {
    pub name: String,
    pub message: String,
}

impl TaskFailure {
    pub fn new<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// The asynchronous unit of work wrapped by a [`TaskSpec`].
///
/// Arguments arrive in the order the resolver produced them; positions whose
/// paths could not be resolved hold `Value::Null` and the task must cope with
/// them itself.
#[async_trait]
pub trait TaskFn: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> Result<Value, TaskFailure>;
}

struct ClosureTask<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> TaskFn for ClosureTask<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, TaskFailure>> + Send,
{
    async fn call(&self, args: Vec<Value>) -> Result<Value, TaskFailure> {
        (self.f)(args).await
    }
}

/// Wrap an async closure as a shareable [`TaskFn`].
pub fn task_fn<F, Fut>(f: F) -> Arc<dyn TaskFn>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TaskFailure>> + Send + 'static,
{
    Arc::new(ClosureTask { f })
}

/// Argument sourcing from the original request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestArgs {
    /// Dotted paths looked up in the request payload, in argument order.
    pub request_args_keys: Vec<String>,
}

/// Argument sourcing from a previous task's cached output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevTaskDataAsArg {
    /// Id of the task whose cached output is the lookup source.
    pub prev_task_id: u64,
    /// Dotted paths looked up in that output, in argument order.
    pub prev_task_data_args: Vec<String>,
}

/// Whether a task's return value is retained for later steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskReturnData {
    pub cache_data: bool,
}

/// One step of a pipeline.
///
/// `task_id` is the 1-based sequence position identifier; by convention it
/// matches the step's index + 1, but the engine does not enforce that.
#[derive(Clone)]
pub struct TaskSpec {
    pub task_id: u64,
    /// Human-readable label, used only for diagnostics.
    pub task_name: String,
    pub task: Arc<dyn TaskFn>,
    pub request_args: Option<RequestArgs>,
    pub prev_task_data_as_arg: Option<PrevTaskDataAsArg>,
    pub task_return_data: Option<TaskReturnData>,
}

impl TaskSpec {
    pub fn new<S: Into<String>>(task_id: u64, task_name: S, task: Arc<dyn TaskFn>) -> Self {
        Self {
            task_id,
            task_name: task_name.into(),
            task,
            request_args: None,
            prev_task_data_as_arg: None,
            task_return_data: None,
        }
    }

    /// Source arguments from the original request payload using these keys.
    pub fn with_request_args<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request_args = Some(RequestArgs {
            request_args_keys: keys.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Source arguments from the cached output of the task with `prev_task_id`.
    pub fn with_prev_task_data<I, S>(mut self, prev_task_id: u64, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prev_task_data_as_arg = Some(PrevTaskDataAsArg {
            prev_task_id,
            prev_task_data_args: keys.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Retain this task's output in the cache store, keyed by its task id.
    pub fn with_cached_output(mut self) -> Self {
        self.task_return_data = Some(TaskReturnData { cache_data: true });
        self
    }

    /// Whether this step's output should be cached after execution.
    pub fn caches_output(&self) -> bool {
        self.task_return_data
            .map(|retained| retained.cache_data)
            .unwrap_or(false)
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("task_id", &self.task_id)
            .field("task_name", &self.task_name)
            .field("request_args", &self.request_args)
            .field("prev_task_data_as_arg", &self.prev_task_data_as_arg)
            .field("task_return_data", &self.task_return_data)
            .finish_non_exhaustive()
    }
}
