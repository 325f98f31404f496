use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json as ResponseJson, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::agents;
use crate::models::{AppState, ErrorResponse, RunRequest, StatusResponse, ToolInfo};
use crate::session::{RunOutcome, SessionError};
use crate::stream::{AgentEvent, ChannelSink};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agent/run", post(run_agent))
        .route("/api/agent/status", get(get_status))
        .route("/api/tools", get(list_tools))
        .with_state(state)
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::EmptyQuery => StatusCode::BAD_REQUEST,
            SessionError::Busy => StatusCode::CONFLICT,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Start a run and stream its events
///
/// Emits `token` events while the model writes, then exactly one `final` or
/// `error` event.
pub async fn run_agent(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, SessionError> {
    let guard = state.session.try_start(&request.query).map_err(|e| {
        warn!(error = %e, "Run request rejected");
        e
    })?;

    let run_id = Uuid::new_v4();
    let query = request.query.trim().to_string();
    info!(run_id = %run_id, query = %query, "Run accepted");

    let (tx, rx) = mpsc::unbounded_channel();
    let agent = state.agent.clone();

    tokio::spawn(
        async move {
            // A panic inside the run surfaces as a JoinError here
            let run_tx = tx.clone();
            let run = tokio::spawn(
                async move {
                    let mut sink = ChannelSink::new(run_tx);
                    agents::execute_research_run(&agent, &query, &mut sink).await
                }
                .in_current_span(),
            );

            let outcome = match run.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Research run aborted");
                    RunOutcome::Failed(format!("Research run aborted: {}", e))
                }
            };

            // Back to Idle before the page learns the run is over
            drop(guard);
            let _ = tx.send(AgentEvent::from(outcome));
        }
        .instrument(tracing::info_span!("run", run_id = %run_id)),
    );

    let stream = UnboundedReceiverStream::new(rx).map(|event| Ok(to_sse_event(&event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &AgentEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|_| Event::default())
}

async fn get_status(State(state): State<AppState>) -> ResponseJson<StatusResponse> {
    Json(StatusResponse {
        state: state.session.state(),
    })
}

async fn list_tools(State(state): State<AppState>) -> ResponseJson<Vec<ToolInfo>> {
    let tools = state
        .agent
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
        })
        .collect();
    Json(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Completion;
    use crate::routes::testing::state_with;
    use crate::session::RunState;
    use crate::stream::StreamSink;
    use crate::tools::testing::RecordingCompletion;
    use crate::types::{AppError, AppResult};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Failing;

    #[async_trait]
    impl Completion for Failing {
        async fn complete_with_stop(
            &self,
            _prompt: &str,
            _stop: &[String],
            sink: Option<&mut (dyn StreamSink + Send)>,
        ) -> AppResult<String> {
            if let Some(sink) = sink {
                sink.emit("Thought: let me");
            }
            Err(AppError::LLMApi("API error (401): invalid key".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Completion for Panicking {
        async fn complete_with_stop(
            &self,
            _prompt: &str,
            _stop: &[String],
            sink: Option<&mut (dyn StreamSink + Send)>,
        ) -> AppResult<String> {
            if let Some(sink) = sink {
                sink.emit("Thought:");
            }
            panic!("malformed xref table");
        }
    }

    /// Answers with the number of the call, so runs can be told apart
    #[derive(Default)]
    struct Numbered {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Completion for Numbered {
        async fn complete_with_stop(
            &self,
            _prompt: &str,
            _stop: &[String],
            sink: Option<&mut (dyn StreamSink + Send)>,
        ) -> AppResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let reply = format!("Final Answer: answer-{}", n);
            if let Some(sink) = sink {
                sink.emit(&format!("token-{} ", n));
            }
            Ok(reply)
        }
    }

    fn run_request(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/agent/run")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "query": query }).to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let state = state_with(Arc::new(RecordingCompletion::replying("Final Answer: x")));
        let response = router(state.clone()).oneshot(run_request("   ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Query must not be empty"));
        assert_eq!(state.session.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_run_rejected() {
        let state = state_with(Arc::new(RecordingCompletion::replying("Final Answer: x")));
        let _guard = state.session.try_start("first").unwrap();

        let response = router(state.clone()).oneshot(run_request("second")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(body_text(response).await.contains("already in progress"));
    }

    #[tokio::test]
    async fn test_run_streams_tokens_then_final() {
        let completion = Arc::new(RecordingCompletion::replying("Final Answer: 42"));
        let state = state_with(completion.clone());

        let response = router(state.clone()).oneshot(run_request("meaning of life")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );

        let text = body_text(response).await;
        let token_at = text.find("event: token").expect("token event");
        let final_at = text.find("event: final").expect("final event");
        assert!(token_at < final_at);
        assert!(text.contains(r#""answer":"42""#));
        assert!(!text.contains("event: error"));

        assert!(completion.last_prompt().contains("Question: meaning of life"));
        assert_eq!(state.session.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_failed_run_streams_error_only() {
        let state = state_with(Arc::new(Failing));

        let response = router(state.clone()).oneshot(run_request("anything")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        assert!(text.contains("event: token"));
        assert!(text.contains("event: error"));
        assert!(text.contains("invalid key"));
        assert!(!text.contains("event: final"));
        assert_eq!(state.session.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_panicking_run_still_ends_with_error() {
        let state = state_with(Arc::new(Panicking));

        let response = router(state.clone()).oneshot(run_request("anything")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        let token_at = text.find("event: token").expect("token event");
        let error_at = text.find("event: error").expect("error event");
        assert!(token_at < error_at);
        assert!(text.contains("Research run aborted"));
        assert!(!text.contains("event: final"));
        assert_eq!(state.session.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_back_to_back_runs_stream_separately() {
        let state = state_with(Arc::new(Numbered::default()));

        let first = router(state.clone()).oneshot(run_request("first")).await.unwrap();
        let first = body_text(first).await;
        assert!(first.contains("token-1 "));
        assert!(first.contains(r#""answer":"answer-1""#));

        let second = router(state.clone()).oneshot(run_request("second")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        let second = body_text(second).await;
        assert!(second.contains("token-2 "));
        assert!(second.contains(r#""answer":"answer-2""#));
        assert!(!second.contains("token-1"));
        assert!(!second.contains("answer-1"));
        assert_eq!(second.matches("event: final").count(), 1);
    }

    #[tokio::test]
    async fn test_status_and_tools() {
        let state = state_with(Arc::new(RecordingCompletion::replying("ok")));

        let response = router(state.clone())
            .oneshot(Request::builder().uri("/api/agent/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, r#"{"state":"idle"}"#);

        let _guard = state.session.try_start("busy").unwrap();
        let response = router(state.clone())
            .oneshot(Request::builder().uri("/api/agent/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, r#"{"state":"running"}"#);

        let response = router(state)
            .oneshot(Request::builder().uri("/api/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let tools: Vec<ToolInfo> = serde_json::from_str(&body_text(response).await).unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["ArxivFetcher", "Summarizer", "DetailedExplainer", "WebSearch", "QnAExtractor"]
        );
    }
}
