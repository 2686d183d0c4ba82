//! Response orchestrator.
//!
//! Drives one query through its phases and turns everything that happens into
//! a single ordered [`EventStream`]:
//!
//! ```text
//! OpenInitial ─► Streaming1 ─► ToolPhase ─┬─► OpenFollowUp ─► Streaming2 ─┐
//!                                         │◄──────────────────────────────┘
//!                                         └─► Terminal
//!        (any provider failure) ─► Failed ─► Terminal
//! ```
//!
//! The returned stream is lazy. Nothing reaches the provider until it is
//! polled, and dropping it drops whichever provider stream is open.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info, Instrument};
use ulid::Ulid;

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::events::Event;
use crate::provider::{DeltaStream, ProviderClient, StreamRequest};
use crate::streaming::{StreamDelta, ToolCall, ToolCallAccumulator};
use crate::tools::{ToolExecutor, ToolRegistry};

/// Ordered events for one query, always ending with [`Event::End`]
pub type EventStream = Pin<Box<dyn Stream<Item = Event> + Send>>;

/// Orchestrator tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Bound on opening a provider stream and on each wait for the next delta
    pub stream_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            stream_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&Config> for OrchestratorOptions {
    fn from(config: &Config) -> Self {
        Self {
            stream_timeout: config.provider_timeout,
        }
    }
}

enum Phase {
    OpenInitial,
    Streaming1 {
        stream: DeltaStream,
        accumulator: ToolCallAccumulator,
    },
    ToolPhase {
        pending: VecDeque<ToolCall>,
    },
    OpenFollowUp {
        call: ToolCall,
        output: Value,
        pending: VecDeque<ToolCall>,
    },
    Streaming2 {
        stream: DeltaStream,
        pending: VecDeque<ToolCall>,
    },
    Failed(EngineError),
    Terminal,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Self::OpenInitial => "open_initial",
            Self::Streaming1 { .. } => "streaming1",
            Self::ToolPhase { .. } => "tool_phase",
            Self::OpenFollowUp { .. } => "open_follow_up",
            Self::Streaming2 { .. } => "streaming2",
            Self::Failed(_) => "failed",
            Self::Terminal => "terminal",
        }
    }
}

/// Per-query state machine over a provider and a tool executor.
///
/// Cheap to share: every [`handle`](Self::handle) call gets its own
/// independent stream and holds no lock on the orchestrator.
pub struct ResponseOrchestrator {
    provider: Arc<dyn ProviderClient>,
    executor: ToolExecutor,
    options: OrchestratorOptions,
}

impl ResponseOrchestrator {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        registry: Arc<ToolRegistry>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            provider,
            executor: ToolExecutor::new(registry),
            options,
        }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Answer one query as a stream of events.
    pub fn handle(&self, query: impl Into<String>) -> EventStream {
        let query = query.into();
        let provider = Arc::clone(&self.provider);
        let executor = self.executor.clone();
        let limit = self.options.stream_timeout;
        let span = tracing::info_span!(
            "orchestrator.handle",
            request_id = %Ulid::new(),
            provider = provider.name(),
        );

        let events = async_stream::stream! {
            let mut phase = Phase::OpenInitial;
            let mut tool_calls = 0usize;

            loop {
                let from = phase.label();
                phase = match phase {
                    Phase::OpenInitial => {
                        let request = StreamRequest::initial(&query, executor.schemas());
                        match open(provider.as_ref(), request, limit).instrument(span.clone()).await {
                            Ok(stream) => Phase::Streaming1 {
                                stream,
                                accumulator: ToolCallAccumulator::new(),
                            },
                            Err(e) => Phase::Failed(e),
                        }
                    }

                    Phase::Streaming1 { mut stream, mut accumulator } => {
                        match next_delta(&mut stream, limit).await {
                            Ok(Some(StreamDelta::Content { text })) => {
                                if !text.trim().is_empty() {
                                    yield Event::Chunk(text);
                                }
                                Phase::Streaming1 { stream, accumulator }
                            }
                            Ok(Some(delta)) => {
                                if let Some(notice) = accumulator.accumulate(&delta) {
                                    yield Event::ToolUse {
                                        name: notice.name,
                                        parameters: notice.parameters,
                                    };
                                }
                                Phase::Streaming1 { stream, accumulator }
                            }
                            Ok(None) => {
                                let calls = accumulator.finish();
                                tool_calls = calls.len();
                                Phase::ToolPhase { pending: calls.into() }
                            }
                            Err(e) => Phase::Failed(e),
                        }
                    }

                    Phase::ToolPhase { mut pending } => match pending.pop_front() {
                        None => Phase::Terminal,
                        Some(call) => {
                            let result = executor
                                .execute(&call.name, &call.arguments)
                                .instrument(span.clone())
                                .await;
                            yield Event::ToolOutput {
                                name: result.tool_name,
                                output: result.output.clone(),
                                success: result.success,
                            };
                            if result.success {
                                Phase::OpenFollowUp {
                                    call,
                                    output: result.output,
                                    pending,
                                }
                            } else {
                                Phase::ToolPhase { pending }
                            }
                        }
                    },

                    Phase::OpenFollowUp { call, output, pending } => {
                        let request = StreamRequest::follow_up(&query, &call, &output);
                        match open(provider.as_ref(), request, limit).instrument(span.clone()).await {
                            Ok(stream) => Phase::Streaming2 { stream, pending },
                            Err(e) => Phase::Failed(e),
                        }
                    }

                    Phase::Streaming2 { mut stream, pending } => {
                        match next_delta(&mut stream, limit).await {
                            Ok(Some(StreamDelta::Content { text })) => {
                                if !text.trim().is_empty() {
                                    yield Event::Chunk(text);
                                }
                                Phase::Streaming2 { stream, pending }
                            }
                            // The follow-up carries no tools; stray fragments are ignored
                            Ok(Some(_)) => Phase::Streaming2 { stream, pending },
                            Ok(None) => Phase::ToolPhase { pending },
                            Err(e) => Phase::Failed(e),
                        }
                    }

                    Phase::Failed(e) => {
                        error!(parent: &span, error = %e, "provider stream failed");
                        yield Event::error(e.to_string());
                        Phase::Terminal
                    }

                    Phase::Terminal => {
                        info!(parent: &span, tool_calls, "response complete");
                        yield Event::End;
                        break;
                    }
                };

                let to = phase.label();
                if to != from {
                    debug!(parent: &span, from, to, "phase transition");
                }
            }
        };

        Box::pin(events)
    }
}

async fn open(
    provider: &dyn ProviderClient,
    request: StreamRequest,
    limit: Duration,
) -> Result<DeltaStream> {
    tokio::time::timeout(limit, provider.open_stream(request))
        .await
        .map_err(|_| EngineError::Timeout(limit))?
}

async fn next_delta(stream: &mut DeltaStream, limit: Duration) -> Result<Option<StreamDelta>> {
    tokio::time::timeout(limit, stream.next())
        .await
        .map_err(|_| EngineError::Timeout(limit))?
        .transpose()
}
