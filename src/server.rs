//! HTTP adapter exposing one pipeline behind a warp server
//!
//! The server owns a [`Sequencer`] bound to one task spec list and drives one
//! engine step per inbound request. Clients poll `POST /invoke` until the
//! final task's data comes back and the pipeline resets.

use serde_json::{Map, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, Instrument};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::Filter;

use crate::pipeline::outcome::Outcome;
use crate::pipeline::sequencer::Sequencer;
use crate::pipeline::spec::TaskSpec;
use crate::pipeline_span;

/// Shallow defensive copy of an inbound parameter object into the request
/// payload map. No semantic transformation is applied.
pub fn remap_request_args(params: &Map<String, Value>) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Decide the HTTP status and body for an outcome.
///
/// The checks run in order: a null-data outcome with a task id is a success
/// (intermediate step), an error status is surfaced with the error object
/// alone as body, and anything with data is a success. The engine always
/// returns a fully-populated outcome, so the remaining case (fresh state,
/// no data, no error) also responds with the full outcome.
fn reply_parts(outcome: &Outcome) -> (StatusCode, Value) {
    let full_body = || serde_json::to_value(outcome).unwrap_or(Value::Null);

    if outcome.data.is_null() && outcome.task_id > 0 {
        return (StatusCode::OK, full_body());
    }

    if outcome.error.status > 0 {
        let status =
            StatusCode::from_u16(outcome.error.status).unwrap_or(StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(&outcome.error).unwrap_or(Value::Null);
        return (status, body);
    }

    (StatusCode::OK, full_body())
}

/// Map an outcome to a warp reply using the ordered status mapping.
pub fn outcome_reply(outcome: &Outcome) -> impl warp::Reply {
    let (status, body) = reply_parts(outcome);
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// HTTP server driving one pipeline instance.
pub struct PipelineServer {
    pipeline_id: String,
    port: u16,
    sequencer: Arc<Sequencer>,
    specs: Arc<Vec<TaskSpec>>,
}

impl PipelineServer {
    /// Create a new server bound to one task spec list.
    pub fn new(pipeline_id: String, port: u16, specs: Vec<TaskSpec>) -> Self {
        Self {
            pipeline_id,
            port,
            sequencer: Arc::new(Sequencer::new()),
            specs: Arc::new(specs),
        }
    }

    /// The sequencer backing this server.
    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    /// Start serving. Runs until the process shuts down.
    pub async fn start(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let invoke_server = self.clone();

        // POST /invoke - drive one pipeline step
        let invoke_route = warp::path("invoke")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |params: Map<String, Value>| {
                let server = invoke_server.clone();
                async move {
                    let outcome = server.handle_invoke(params).await;
                    Ok::<_, Infallible>(outcome_reply(&outcome))
                }
            });

        // GET /live - liveness probe
        let live_route = warp::path("live")
            .and(warp::get())
            .map(|| warp::reply::json(&serde_json::json!({"alive": true})));

        let routes = invoke_route
            .or(live_route)
            .with(warp::cors().allow_any_origin());

        info!(
            pipeline_id = %self.pipeline_id,
            port = self.port,
            "Starting pipeline server"
        );

        warp::serve(routes).run(([0, 0, 0, 0], self.port)).await;

        Ok(())
    }

    /// Drive one engine step for an inbound request.
    pub async fn handle_invoke(&self, params: Map<String, Value>) -> Outcome {
        let request_id = Uuid::new_v4();
        let request_args = remap_request_args(&params);

        let span = pipeline_span!(
            pipeline_id = %self.pipeline_id,
            request_id = %request_id
        );

        let outcome = self
            .sequencer
            .invoke(&request_args, &self.specs)
            .instrument(span)
            .await;

        info!(
            %request_id,
            task_id = outcome.task_id,
            error_status = outcome.error.status,
            "pipeline invocation finished"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outcome::OutcomeError;
    use crate::pipeline::spec::task_fn;
    use serde_json::json;

    #[test]
    fn test_remap_is_a_shallow_copy() {
        let params = json!({"a": 1, "nested": {"b": 2}});
        let params = params.as_object().unwrap();

        let remapped = remap_request_args(params);

        assert_eq!(&remapped, params);
        assert_eq!(remapped.len(), 2);
    }

    #[test]
    fn test_null_data_with_task_id_is_success() {
        let outcome = Outcome::success(Value::Null, 2);
        let (status, body) = reply_parts(&outcome);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taskId"], json!(2));
        assert!(body.get("error").is_some());
    }

    #[test]
    fn test_error_status_surfaces_error_object_alone() {
        let outcome = Outcome::failure(
            json!({}),
            OutcomeError {
                status: 400,
                name: "SpecLookupError".to_string(),
                message: "no task spec at step index 0 (list has 0 entries)".to_string(),
            },
            0,
        );
        let (status, body) = reply_parts(&outcome);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["name"], json!("SpecLookupError"));
        // The error object is the whole body; no outcome fields around it.
        assert!(body.get("taskId").is_none());
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_data_present_is_success_with_full_outcome() {
        let outcome = Outcome::success(json!({"sum": 43}), 3);
        let (status, body) = reply_parts(&outcome);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"sum": 43}));
        assert_eq!(body["taskId"], json!(3));
    }

    #[test]
    fn test_null_data_check_precedes_error_check() {
        // Mapping order: the null-data success branch wins even when an
        // error status is set, matching the adapter contract.
        let outcome = Outcome::failure(
            Value::Null,
            OutcomeError {
                status: 400,
                name: "X".to_string(),
                message: "y".to_string(),
            },
            2,
        );
        let (status, body) = reply_parts(&outcome);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taskId"], json!(2));
    }

    #[tokio::test]
    async fn test_handle_invoke_drives_the_sequencer() {
        let specs = vec![TaskSpec::new(
            1,
            "only",
            task_fn(|_| async { Ok(json!({"done": true})) }),
        )];
        let server = PipelineServer::new("test".to_string(), 0, specs);

        let outcome = server
            .handle_invoke(json!({}).as_object().unwrap().clone())
            .await;

        assert_eq!(outcome.data, json!({"done": true}));
        assert_eq!(outcome.task_id, 2);
    }
}
