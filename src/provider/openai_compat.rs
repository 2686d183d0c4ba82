//! OpenAI-compatible `/chat/completions` streaming adapter (Groq by default).

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DeltaStream, ProviderClient, StreamRequest};
use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::{EngineError, Result};
use crate::streaming::StreamDelta;
use crate::{ChatMessage, ToolSchema};

const DONE_SENTINEL: &str = "[DONE]";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL up to (not including) `/chat/completions`
    pub base_url: String,
}

impl ProviderConfig {
    /// Groq's OpenAI-compatible endpoint
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl From<&Config> for ProviderConfig {
    fn from(config: &Config) -> Self {
        Self::groq(&config.api_key, &config.model).with_base_url(&config.base_url)
    }
}

/// Streaming client for any OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(config, http))
    }

    /// Use a caller-provided HTTP client
    pub fn with_client(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

/// One `data:` payload of the completion stream
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallChunk>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallChunk {
    index: Option<usize>,
    id: Option<String>,
    function: Option<FunctionChunk>,
}

#[derive(Debug, Deserialize)]
struct FunctionChunk {
    name: Option<String>,
    arguments: Option<String>,
}

impl CompletionChunk {
    /// Deltas carried by the first choice; chunks with nothing in them yield none.
    fn into_deltas(self) -> Vec<StreamDelta> {
        let Some(delta) = self.choices.into_iter().next().and_then(|c| c.delta) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            out.push(StreamDelta::Content { text });
        }
        for (position, call) in delta.tool_calls.unwrap_or_default().into_iter().enumerate() {
            let (name, arguments_delta) = match call.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            if call.id.is_none() && name.is_none() && arguments_delta.is_none() {
                continue;
            }
            out.push(StreamDelta::ToolCallFragment {
                index: call.index.unwrap_or(position),
                id: call.id,
                name,
                arguments_delta,
            });
        }
        out
    }
}

fn error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[async_trait]
impl ProviderClient for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<DeltaStream> {
        let tools = request.tools.as_deref().filter(|t| !t.is_empty());
        let body = CompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            stream: true,
            tools,
            tool_choice: tools.map(|_| match request.allow_tool_choice {
                true => "auto",
                false => "none",
            }),
        };

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            tools = tools.map_or(0, <[ToolSchema]>::len),
            "opening completion stream"
        );

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(EngineError::provider(status.as_u16(), text));
        }

        let mut events = Box::pin(response.bytes_stream().eventsource());
        let deltas = async_stream::stream! {
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(EngineError::Http(e.to_string()));
                        break;
                    }
                };
                if event.data.trim() == DONE_SENTINEL {
                    break;
                }
                let chunk = match serde_json::from_str::<CompletionChunk>(&event.data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(EngineError::Decode(e.to_string()));
                        break;
                    }
                };
                if let Some(error) = &chunk.error {
                    yield Err(EngineError::provider(status.as_u16(), error_message(error)));
                    break;
                }
                for delta in chunk.into_deltas() {
                    yield Ok(delta);
                }
            }
        };

        Ok(Box::pin(deltas))
    }
}
