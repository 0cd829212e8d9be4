use serde::Deserialize;
use serde_json::Value;

use crate::completions::request::FunctionToolCall;
use crate::core::{
    ChatCompletion, FinishReason, LanguageModelUsage, LlmError, StreamDelta, ToolCall,
    http::describe_error_payload,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub choices: Vec<Choice>,

    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,

    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,

    /// The refusal explanation from the model.
    pub refusal: Option<String>,

    pub tool_calls: Option<Vec<FunctionToolCall>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<Usage> for LanguageModelUsage {
    fn from(usage: Usage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

impl ChatResponse {
    /// Keeps the first choice; the client never asks for more than one.
    pub(crate) fn into_completion(self) -> Result<ChatCompletion, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::provider("No choices in response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::from)
            .collect();

        Ok(ChatCompletion {
            id: self.id,
            model: self.model,
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            refusal: choice.message.refusal,
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from),
            usage: self.usage.map(Into::into),
        })
    }
}

/// One `data:` payload of a streaming response.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    pub usage: Option<Usage>,

    /// Present when the provider fails after the stream has started.
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,

    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Delta {
    pub content: Option<String>,
}

impl ChatChunk {
    /// `Ok(None)` for chunks that carry nothing worth yielding (e.g. role-only deltas).
    pub(crate) fn into_delta(self) -> Result<Option<StreamDelta>, LlmError> {
        if let Some(error) = self.error {
            let (message, code) = describe_error_payload(&serde_json::json!({ "error": error }));
            return Err(LlmError::Provider {
                message: message.unwrap_or_else(|| "Stream aborted by provider".to_string()),
                status_code: None,
                code,
            });
        }

        let (delta, finish_reason) = match self.choices.into_iter().next() {
            Some(choice) => (
                choice.delta.content.unwrap_or_default(),
                choice.finish_reason.as_deref().map(FinishReason::from),
            ),
            None => (String::new(), None),
        };
        let usage = self.usage.map(LanguageModelUsage::from);

        if delta.is_empty() && finish_reason.is_none() && usage.is_none() {
            return Ok(None);
        }

        Ok(Some(StreamDelta {
            delta,
            finish_reason,
            usage,
        }))
    }
}
