use serde_json::Value;

use crate::constants;

use super::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Decoded arguments. Arguments that are not valid JSON are kept as a string.
    pub arguments: Value,
}

/// The output of a tool call, sent back to the model as a `tool` message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub content: Value,
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationMessage {
    Chat(Message),
    /// An assistant turn that asked for tool calls.
    ToolCalls {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    ToolCallResult(ToolCallResult),
}

impl From<Message> for ConversationMessage {
    fn from(message: Message) -> Self {
        ConversationMessage::Chat(message)
    }
}

impl From<ToolCallResult> for ConversationMessage {
    fn from(result: ToolCallResult) -> Self {
        ConversationMessage::ToolCallResult(result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema of the arguments object.
    pub parameters: Value,
    pub strict: Option<bool>,
}

impl Tool {
    /// Builds a tool whose parameters schema is generated from `P`.
    pub fn for_params<P>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, LlmError>
    where
        P: schemars::JsonSchema,
    {
        let schema = schemars::schema_for!(P);
        let mut parameters = serde_json::to_value(&schema).map_err(|e| {
            LlmError::Config(format!("Failed to build tool parameter schema: {e}"))
        })?;

        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }

        Ok(Self {
            name: name.into(),
            description: Some(description.into()),
            parameters,
            strict: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Function { name: String },
}

/// Sampling parameters. Unset fields are left to the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter (0.0 to 1.0)
    pub top_p: Option<f32>,
    pub seed: Option<i64>,
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema(JsonSchemaFormat),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: Value,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationMessage>,
    pub stream: bool,
    pub response_format: Option<ResponseFormat>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
    /// Whether the model may request several tool calls in one turn (default: true)
    pub parallel_tool_calls: Option<bool>,
    pub generation_config: GenerationConfig,
}

impl CompletionRequest {
    pub fn new<I, M>(model: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ConversationMessage>,
    {
        Self {
            model: model.into(),
            messages: messages.into_iter().map(Into::into).collect(),
            stream: false,
            response_format: None,
            tools: None,
            tool_choice: None,
            parallel_tool_calls: None,
            generation_config: GenerationConfig::default(),
        }
    }

    /// A request against the default chat model.
    pub fn with_default_model<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ConversationMessage>,
    {
        Self::new(constants::DEFAULT_CHAT_MODEL, messages)
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = Some(parallel);
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    pub fn push_message(&mut self, message: impl Into<ConversationMessage>) {
        self.messages.push(message.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl From<&str> for FinishReason {
    fn from(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageModelUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Result of a blocking chat completion (first choice only).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub id: String,
    pub model: String,
    /// Message text; empty when the provider sent no content (e.g. tool calls only).
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub refusal: Option<String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<LanguageModelUsage>,
}

impl ChatCompletion {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant turn to append to the conversation before sending tool results.
    pub fn to_message(&self) -> ConversationMessage {
        if self.tool_calls.is_empty() {
            ConversationMessage::Chat(Message::assistant(self.content.clone()))
        } else {
            ConversationMessage::ToolCalls {
                content: (!self.content.is_empty()).then(|| self.content.clone()),
                tool_calls: self.tool_calls.clone(),
            }
        }
    }
}

/// One fragment of a streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDelta {
    pub delta: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<LanguageModelUsage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    pub id: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResponse<T> {
    pub content: T,
    pub usage: Option<LanguageModelUsage>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageResponseFormat {
    Url,
    B64Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    /// Number of images to generate
    pub n: Option<u32>,
    pub response_format: Option<ImageResponseFormat>,
}

impl ImageRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            n: None,
            response_format: None,
        }
    }

    pub fn with_count(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_response_format(mut self, format: ImageResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    Url(String),
    Base64(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: ImageData,
    pub revised_prompt: Option<String>,
}

impl GeneratedImage {
    pub fn url_or_data(&self) -> &str {
        match &self.data {
            ImageData::Url(url) => url,
            ImageData::Base64(data) => data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGeneration {
    pub images: Vec<GeneratedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct TemperatureRequest {
        /// The city and state, e.g. San Francisco, CA
        location: String,
        unit: Option<String>,
    }

    #[test]
    fn tool_parameters_come_from_schema() {
        let tool = Tool::for_params::<TemperatureRequest>(
            "get_current_temperature",
            "Get the current temperature in a given location",
        )
        .unwrap();

        assert_eq!(tool.name, "get_current_temperature");
        assert_eq!(tool.parameters["type"], "object");
        assert_eq!(
            tool.parameters["properties"]["location"]["description"],
            "The city and state, e.g. San Francisco, CA"
        );
        assert_eq!(tool.parameters["required"], serde_json::json!(["location"]));
        assert!(tool.parameters.get("$schema").is_none());
    }

    #[test]
    fn request_accepts_plain_messages() {
        let request = CompletionRequest::new("m", vec![Message::user("2+2?")]).with_stream(true);
        assert_eq!(request.model, "m");
        assert!(request.stream);
        assert_eq!(
            request.messages,
            vec![ConversationMessage::Chat(Message::user("2+2?"))]
        );
    }

    #[test]
    fn finish_reason_parsing() {
        assert_eq!(FinishReason::from("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(
            FinishReason::from("end_turn"),
            FinishReason::Other("end_turn".to_string())
        );
    }

    #[test]
    fn completion_with_tool_calls_becomes_tool_call_turn() {
        let completion = ChatCompletion {
            id: "c1".to_string(),
            model: "m".to_string(),
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "lookup".to_string(),
                arguments: serde_json::json!({}),
            }],
            refusal: None,
            finish_reason: Some(FinishReason::ToolCalls),
            usage: None,
        };

        match completion.to_message() {
            ConversationMessage::ToolCalls {
                content,
                tool_calls,
            } => {
                assert!(content.is_none());
                assert_eq!(tool_calls.len(), 1);
            }
            other => panic!("expected tool call turn, got {other:?}"),
        }
    }
}
