use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{
    ChatRole, CompletionRequest, ConversationMessage, ResponseFormat, Tool, ToolCall, ToolChoice,
};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,

    pub messages: Vec<RequestMessage>,

    pub stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<RequestResponseFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<RequestTool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<RequestToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Alter this or temperature but not both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RequestRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RequestMessage {
    pub role: RequestRole,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<FunctionToolCall>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A tool call as it appears on the wire, in requests and responses alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionToolCall {
    #[serde(default)]
    pub id: String,

    /// Always `function`
    #[serde(rename = "type", default = "function_type")]
    pub r#type: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,

    /// JSON-encoded arguments object
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

impl From<&ToolCall> for FunctionToolCall {
    fn from(call: &ToolCall) -> Self {
        let arguments = match &call.arguments {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };

        Self {
            id: call.id.clone(),
            r#type: function_type(),
            function: FunctionCall {
                name: call.name.clone(),
                arguments,
            },
        }
    }
}

impl From<FunctionToolCall> for ToolCall {
    fn from(call: FunctionToolCall) -> Self {
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));

        Self {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum RequestResponseFormat {
    Text,
    JsonObject,
    JsonSchema { json_schema: RequestJsonSchema },
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RequestJsonSchema {
    pub name: String,

    pub schema: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RequestTool {
    /// Always `function`
    pub r#type: &'static str,

    pub function: RequestFunction,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RequestFunction {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parameters: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum RequestToolChoice {
    Mode(&'static str),
    Function {
        r#type: &'static str,
        function: FunctionName,
    },
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FunctionName {
    pub name: String,
}

impl From<&ToolChoice> for RequestToolChoice {
    fn from(choice: &ToolChoice) -> Self {
        match choice {
            ToolChoice::None => RequestToolChoice::Mode("none"),
            ToolChoice::Auto => RequestToolChoice::Mode("auto"),
            ToolChoice::Required => RequestToolChoice::Mode("required"),
            ToolChoice::Function { name } => RequestToolChoice::Function {
                r#type: "function",
                function: FunctionName { name: name.clone() },
            },
        }
    }
}

impl From<&Tool> for RequestTool {
    fn from(tool: &Tool) -> Self {
        Self {
            r#type: "function",
            function: RequestFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
                strict: tool.strict,
            },
        }
    }
}

impl From<&ResponseFormat> for RequestResponseFormat {
    fn from(format: &ResponseFormat) -> Self {
        match format {
            ResponseFormat::Text => RequestResponseFormat::Text,
            ResponseFormat::JsonObject => RequestResponseFormat::JsonObject,
            ResponseFormat::JsonSchema(schema) => RequestResponseFormat::JsonSchema {
                json_schema: RequestJsonSchema {
                    name: schema.name.clone(),
                    schema: schema.schema.clone(),
                    strict: schema.strict,
                },
            },
        }
    }
}

impl From<&ConversationMessage> for RequestMessage {
    fn from(message: &ConversationMessage) -> Self {
        match message {
            ConversationMessage::Chat(m) => RequestMessage {
                role: match m.role {
                    ChatRole::System => RequestRole::System,
                    ChatRole::User => RequestRole::User,
                    ChatRole::Assistant => RequestRole::Assistant,
                },
                content: Some(m.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            ConversationMessage::ToolCalls {
                content,
                tool_calls,
            } => RequestMessage {
                role: RequestRole::Assistant,
                content: content.clone(),
                tool_calls: Some(tool_calls.iter().map(FunctionToolCall::from).collect()),
                tool_call_id: None,
            },
            ConversationMessage::ToolCallResult(result) => RequestMessage {
                role: RequestRole::Tool,
                content: Some(match &result.content {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                }),
                tool_calls: None,
                tool_call_id: Some(result.tool_call_id.clone()),
            },
        }
    }
}

/// Builds the wire payload. `stream` overrides the request's own flag.
pub(crate) fn build_chat_request(request: &CompletionRequest, stream: bool) -> ChatRequest {
    let generation = &request.generation_config;

    ChatRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(RequestMessage::from).collect(),
        stream,
        response_format: request
            .response_format
            .as_ref()
            .map(RequestResponseFormat::from),
        tools: request
            .tools
            .as_ref()
            .filter(|tools| !tools.is_empty())
            .map(|tools| tools.iter().map(RequestTool::from).collect()),
        tool_choice: request.tool_choice.as_ref().map(RequestToolChoice::from),
        parallel_tool_calls: request.parallel_tool_calls,
        max_tokens: generation.max_tokens,
        temperature: generation.temperature,
        top_p: generation.top_p,
        seed: generation.seed,
        stop: generation.stop.clone(),
    }
}
