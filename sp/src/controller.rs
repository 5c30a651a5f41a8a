//! Plan Controller - request lifecycle and state publication
//!
//! The controller drives one request at a time through prompt, transport and
//! pipeline, and publishes every state change on a `watch` channel that the
//! presentation layer subscribes to.
//!
//! Requests are never cancelled. Each one gets a generation number; when a
//! newer request starts, results of older ones are dropped instead of
//! published.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{Schedule, SchedulingRequest, TaskListRequest};
use crate::pipeline::{FailureKind, Pipeline, PlanError};
use crate::prompts::PromptBuilder;
use crate::transport::{ModelTransport, TransportError};

/// Lifecycle state of the current plan request
#[derive(Debug, Clone, Default)]
pub enum PlanState {
    #[default]
    Idle,
    Requesting,
    Success(Schedule),
    Failed(Arc<PlanError>),
}

impl PlanState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, Self::Requesting)
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            Self::Success(schedule) => Some(schedule),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PlanError> {
        match self {
            Self::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Serializable snapshot for machine consumers
    pub fn report(&self) -> StateReport<'_> {
        match self {
            Self::Idle => StateReport::Idle,
            Self::Requesting => StateReport::Requesting,
            Self::Success(schedule) => StateReport::Success { steps: schedule },
            Self::Failed(err) => StateReport::Failed {
                kind: err.kind(),
                stage: err.stage(),
                message: err.to_string(),
                raw_sample: err.raw_sample(),
            },
        }
    }
}

impl From<Result<Schedule, PlanError>> for PlanState {
    fn from(result: Result<Schedule, PlanError>) -> Self {
        match result {
            Ok(schedule) => Self::Success(schedule),
            Err(err) => Self::Failed(Arc::new(err)),
        }
    }
}

/// JSON shape of a [`PlanState`]
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StateReport<'a> {
    Idle,
    Requesting,
    Success {
        steps: &'a Schedule,
    },
    Failed {
        kind: FailureKind,
        stage: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_sample: Option<&'a str>,
    },
}

/// Owns the current plan state and runs requests against a model transport
pub struct PlanController {
    transport: Arc<dyn ModelTransport>,
    prompts: PromptBuilder,
    pipeline: Pipeline,
    timeout: Duration,
    state_tx: watch::Sender<PlanState>,
    generation: AtomicU64,
}

impl PlanController {
    pub fn new(
        transport: Arc<dyn ModelTransport>,
        prompts: PromptBuilder,
        pipeline: Pipeline,
        timeout: Duration,
    ) -> Self {
        debug!(transport = transport.name(), ?timeout, "PlanController::new: called");
        let (state_tx, _) = watch::channel(PlanState::Idle);
        Self {
            transport,
            prompts,
            pipeline,
            timeout,
            state_tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Subscribe to state changes
    ///
    /// The receiver starts with the current state already marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<PlanState> {
        debug!("PlanController::subscribe: new subscriber");
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PlanState {
        self.state_tx.borrow().clone()
    }

    /// Request a study schedule
    ///
    /// Returns this request's outcome. The outcome is also published unless
    /// a newer request started in the meantime.
    pub async fn request_plan(&self, request: SchedulingRequest) -> PlanState {
        debug!(?request, "PlanController::request_plan: called");
        let generation = self.begin();
        let result = match self.prompts.build(&request) {
            Ok(prompt) => self.run(&prompt, |raw| self.pipeline.run(raw)).await,
            Err(err) => Err(err.into()),
        };
        self.finish(generation, result)
    }

    /// Request a flat list of study tasks
    pub async fn request_tasks(&self, request: TaskListRequest) -> PlanState {
        debug!(?request, "PlanController::request_tasks: called");
        let generation = self.begin();
        let limit = usize::from(request.count());
        let result = match self.prompts.build_task_list(&request) {
            Ok(prompt) => self.run(&prompt, |raw| self.pipeline.run_task_list(raw, limit)).await,
            Err(err) => Err(err.into()),
        };
        self.finish(generation, result)
    }

    /// Enter `Requesting`, clearing any previous result
    fn begin(&self) -> u64 {
        let mut generation = 0;
        // Bump and publish under the channel lock so finish() sees a consistent pair
        self.state_tx.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = PlanState::Requesting;
        });
        info!(generation, "Plan request started");
        generation
    }

    async fn run<F>(&self, prompt: &str, parse: F) -> Result<Schedule, PlanError>
    where
        F: FnOnce(&str) -> Result<Schedule, PlanError>,
    {
        debug!(prompt_len = prompt.len(), transport = self.transport.name(), "run: calling transport");
        let raw = match tokio::time::timeout(self.timeout, self.transport.generate(prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                debug!(?self.timeout, "run: transport timed out");
                return Err(TransportError::Timeout(self.timeout).into());
            }
        };
        debug!(raw_len = raw.len(), "run: transport returned");
        parse(&raw)
    }

    fn finish(&self, generation: u64, result: Result<Schedule, PlanError>) -> PlanState {
        let outcome = PlanState::from(result);
        let published = self.state_tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = outcome.clone();
            true
        });

        if !published {
            warn!(generation, "Discarding result of superseded plan request");
        } else if let PlanState::Failed(err) = &outcome {
            info!(generation, kind = %err.kind(), "Plan request failed: {}", err);
        } else {
            info!(generation, "Plan request succeeded");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::client::mock::MockTransport;

    const RECORDS: &str = r#"```json
[{"dateOrWeek":"2024-07-01","focus":"Cells","details":"Read ch.1"}]
```"#;

    fn controller(transport: MockTransport) -> (Arc<MockTransport>, PlanController) {
        controller_with_timeout(transport, Duration::from_secs(5))
    }

    fn controller_with_timeout(transport: MockTransport, timeout: Duration) -> (Arc<MockTransport>, PlanController) {
        let transport = Arc::new(transport);
        let controller = PlanController::new(
            transport.clone(),
            PromptBuilder::embedded_only(),
            Pipeline::default(),
            timeout,
        );
        (transport, controller)
    }

    fn request() -> SchedulingRequest {
        SchedulingRequest::new(3).unwrap().with_subject("Biology")
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let (_, controller) = controller(MockTransport::new());
        assert!(matches!(controller.state(), PlanState::Idle));
    }

    #[tokio::test]
    async fn test_success_is_published() {
        let (transport, controller) = controller(MockTransport::new().respond(RECORDS));
        let outcome = controller.request_plan(request()).await;

        let schedule = outcome.schedule().unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.steps()[0].focus, "Cells");
        assert_eq!(controller.state().schedule(), Some(schedule));

        let prompts = transport.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Biology"));
    }

    #[tokio::test]
    async fn test_transport_failure_skips_extraction() {
        let (_, controller) = controller(MockTransport::new().fail(TransportError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        let outcome = controller.request_plan(request()).await;

        let err = outcome.error().unwrap();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.raw_sample().is_none());
        assert!(controller.state().error().is_some());
    }

    #[tokio::test]
    async fn test_extraction_failure() {
        let (_, controller) = controller(MockTransport::new().respond("not json at all"));
        let outcome = controller.request_plan(request()).await;
        assert_eq!(outcome.error().unwrap().kind(), FailureKind::NoStructuredPayload);
    }

    #[tokio::test]
    async fn test_new_request_clears_previous_result() {
        let (_, controller) = controller(
            MockTransport::new()
                .respond("garbage")
                .respond_after(Duration::from_millis(100), RECORDS),
        );
        controller.request_plan(request()).await;
        assert!(controller.state().error().is_some());

        let mut rx = controller.subscribe();
        let pending = controller.request_plan(request());
        tokio::pin!(pending);

        // Requesting is published before the transport answers
        tokio::select! {
            _ = &mut pending => panic!("request finished before state changed"),
            changed = rx.changed() => changed.unwrap(),
        }
        assert!(rx.borrow_and_update().is_requesting());

        let outcome = pending.await;
        assert!(outcome.schedule().is_some());
        assert!(controller.state().error().is_none());
    }

    #[tokio::test]
    async fn test_timeout() {
        let (_, controller) = controller_with_timeout(
            MockTransport::new().respond_after(Duration::from_secs(5), RECORDS),
            Duration::from_millis(50),
        );
        let outcome = controller.request_plan(request()).await;

        let err = outcome.error().unwrap();
        assert!(
            matches!(err, PlanError::Transport(TransportError::Timeout(_))),
            "expected timeout, got: {err}"
        );
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let (_, controller) = controller(
            MockTransport::new()
                .respond_after(Duration::from_millis(200), RECORDS)
                .respond(r#"["Review notes"]"#),
        );

        let first = controller.request_plan(request());
        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller.request_plan(request()).await
        };
        let (first, second) = tokio::join!(first, second);

        // Each caller still gets its own outcome
        assert_eq!(first.schedule().unwrap().steps()[0].focus, "Cells");
        assert_eq!(second.schedule().unwrap().steps()[0].focus, "Review notes");

        // Only the newest one is published
        let state = controller.state();
        assert_eq!(state.schedule().unwrap().steps()[0].focus, "Review notes");
    }

    #[tokio::test]
    async fn test_request_tasks() {
        let (transport, controller) = controller(MockTransport::new().respond(r#"["Review notes", "Do practice set", ""]"#));
        let outcome = controller.request_tasks(TaskListRequest::default()).await;

        assert_eq!(outcome.schedule().unwrap().len(), 2);
        assert!(transport.prompts()[0].contains("a high school student"));
    }

    #[test]
    fn test_report_json() {
        let state = PlanState::from(Err::<Schedule, _>(PlanError::from(
            crate::pipeline::ExtractionError::NoStructuredPayload {
                raw_sample: "hi".to_string(),
            },
        )));
        let json = serde_json::to_value(state.report()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "no_structured_payload");
        assert_eq!(json["stage"], "extraction");
        assert_eq!(json["raw_sample"], "hi");

        let json = serde_json::to_value(PlanState::Idle.report()).unwrap();
        assert_eq!(json["status"], "idle");
    }
}
