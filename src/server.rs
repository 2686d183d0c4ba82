//! HTTP transport: `POST /query` answered with a server-sent event stream.
//!
//! Each orchestrator event is written as one SSE frame followed by the blank
//! dispatch line. While the response is open a keep-alive comment goes out
//! every `ping_interval`. The body ends right after the `end` event, and a
//! client disconnect drops the body and with it the orchestrator stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

use crate::events::EventEncoder;
use crate::orchestrator::{EventStream, ResponseOrchestrator};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ResponseOrchestrator>,
    pub ping_interval: Duration,
    pub app_name: String,
}

/// `POST /query` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        name: state.app_name,
    })
}

async fn query(State(state): State<AppState>, Json(request): Json<QueryRequest>) -> Response {
    info!(
        session_id = request.session_id.as_deref().unwrap_or("-"),
        query_len = request.query.len(),
        "query received"
    );

    let events = state.orchestrator.handle(request.query);
    let mut response = Response::new(Body::from_stream(sse_body(events, state.ping_interval)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// Frame an event stream for the wire, interleaving keep-alive comments.
///
/// The first ping fires one full interval after the response starts.
pub fn sse_body(
    mut events: EventStream,
    ping_interval: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    async_stream::stream! {
        let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    let last = event.is_end();
                    yield Ok(dispatch(EventEncoder::encode(&event)));
                    if last {
                        break;
                    }
                }
                _ = ping.tick() => {
                    yield Ok(dispatch(EventEncoder::keep_alive(Utc::now())));
                }
            }
        }
    }
}

fn dispatch(mut frame: String) -> Bytes {
    frame.push('\n');
    Bytes::from(frame)
}
