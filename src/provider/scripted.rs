//! In-process provider that replays canned turns.
//!
//! Used by the test suites and handy for offline demos. Each call to
//! [`ProviderClient::open_stream`] consumes the next [`ScriptedTurn`] and records
//! the request it was given.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{DeltaStream, ProviderClient, StreamRequest};
use crate::error::{EngineError, Result};
use crate::streaming::StreamDelta;

#[derive(Debug)]
enum Step {
    Delta(StreamDelta),
    Fail(EngineError),
    Delay(Duration),
    Stall,
}

/// One scripted completion
#[derive(Debug, Default)]
pub struct ScriptedTurn {
    steps: Vec<Step>,
    open_error: Option<EngineError>,
}

impl ScriptedTurn {
    pub fn new() -> Self {
        Self::default()
    }

    /// A turn whose stream fails to open
    pub fn open_failure(error: EngineError) -> Self {
        Self {
            steps: Vec::new(),
            open_error: Some(error),
        }
    }

    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Delta(StreamDelta::content(text)));
        self
    }

    /// A complete tool call in a single fragment
    pub fn tool_call(self, index: usize, id: &str, name: &str, arguments: &str) -> Self {
        self.delta(StreamDelta::tool_call(index, id, name, arguments))
    }

    pub fn delta(mut self, delta: StreamDelta) -> Self {
        self.steps.push(Step::Delta(delta));
        self
    }

    /// Fail mid-stream; later steps are never reached
    pub fn fail(mut self, error: EngineError) -> Self {
        self.steps.push(Step::Fail(error));
        self
    }

    pub fn delay(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Delay(duration));
        self
    }

    /// Never produce another item
    pub fn stall(mut self) -> Self {
        self.steps.push(Step::Stall);
        self
    }
}

/// Provider that answers from a queue of [`ScriptedTurn`]s
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<StreamRequest>>,
    live_streams: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(turns: impl IntoIterator<Item = ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Streams handed out and not yet dropped
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }
}

/// Decrements the live-stream count when the stream it lives in is dropped
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<DeltaStream> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let turn = self
            .turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| EngineError::provider(500, "script exhausted"))?;

        if let Some(error) = turn.open_error {
            return Err(error);
        }

        let guard = LiveGuard::new(self.live_streams.clone());
        let steps = turn.steps;
        let stream = async_stream::stream! {
            let _guard = guard;
            for step in steps {
                match step {
                    Step::Delta(delta) => yield Ok(delta),
                    Step::Fail(error) => {
                        yield Err(error);
                        return;
                    }
                    Step::Delay(duration) => tokio::time::sleep(duration).await,
                    Step::Stall => futures_util::future::pending::<()>().await,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
