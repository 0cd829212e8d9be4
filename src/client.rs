use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::completions::CompletionStream;
use crate::completions::request::build_chat_request;
use crate::completions::response::ChatResponse;
use crate::constants;
use crate::core::{
    ChatCompletion, CompletionRequest, ConversationMessage, Credentials, ImageGeneration,
    ImageRequest, LlmError, LlmProvider, StructuredResponse, ToolCallingConfig, ToolCallingGuard,
    ToolChoice, ToolRegistry,
    http::{HttpClient, HttpClientConfig, InspectorConfig},
};
use crate::images::{ImageGenerationRequest, ImageGenerationResponse};

/// Client for the xAI chat completions and image generation endpoints.
///
/// Every operation is a single HTTP request (the tool loop is one request per
/// turn). Nothing is retried and no timeout applies unless configured through
/// [`HttpClientConfig`]. The client holds no per-call state and can be shared
/// across tasks.
pub struct ChatClient {
    credentials: Credentials,
    http: HttpClient,
    tool_calling_config: ToolCallingConfig,
}

impl ChatClient {
    pub fn new(credentials: Credentials) -> Result<Self, LlmError> {
        Self::builder(credentials).build()
    }

    /// Client for `XAI_API_KEY` (and `XAI_BASE_URL`, when set).
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(Credentials::from_env()?)
    }

    pub fn builder(credentials: Credentials) -> ChatClientBuilder {
        ChatClientBuilder {
            credentials,
            http_config: HttpClientConfig::default(),
            inspector_config: InspectorConfig::default(),
            tool_calling_config: ToolCallingConfig::default(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn tool_calling_config(&self) -> &ToolCallingConfig {
        &self.tool_calling_config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.credentials.base_url(), endpoint)
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![self.credentials.auth_header()]
    }

    /// Sends a blocking chat completion. `request.stream` is ignored.
    #[tracing::instrument(
        name = "create_completion",
        skip(self, request),
        fields(model = %request.model, messages = request.messages.len()),
        err
    )]
    pub async fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<ChatCompletion, LlmError> {
        let body = build_chat_request(&request, false);
        let response: ChatResponse = self
            .http
            .post_json(&self.url(constants::CHAT_COMPLETIONS_ENDPOINT), &self.headers(), &body)
            .await?;

        let completion = response.into_completion()?;
        debug!(
            finish_reason = ?completion.finish_reason,
            tool_calls = completion.tool_calls.len(),
            "Completion received"
        );
        Ok(completion)
    }

    /// Opens a streaming chat completion.
    ///
    /// Error statuses are reported here, before any fragment is read.
    #[tracing::instrument(
        name = "stream_completion",
        skip(self, request),
        fields(model = %request.model, messages = request.messages.len()),
        err
    )]
    pub async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, LlmError> {
        let body = build_chat_request(&request, true);
        let response = self
            .http
            .post_stream(&self.url(constants::CHAT_COMPLETIONS_ENDPOINT), &self.headers(), &body)
            .await?;

        CompletionStream::from_response(response).await
    }

    #[tracing::instrument(
        name = "generate_image",
        skip(self, request),
        fields(model = %request.model),
        err
    )]
    pub async fn generate_image(&self, request: ImageRequest) -> Result<ImageGeneration, LlmError> {
        let body = ImageGenerationRequest::from(&request);
        let response: ImageGenerationResponse = self
            .http
            .post_json(&self.url(constants::IMAGE_GENERATIONS_ENDPOINT), &self.headers(), &body)
            .await?;

        response.into_generation()
    }

    /// Asks for JSON matching the schema of `T`, validates the reply and decodes it.
    pub async fn create_structured_completion<T>(
        &self,
        request: CompletionRequest,
    ) -> Result<StructuredResponse<T>, LlmError>
    where
        T: DeserializeOwned + schemars::JsonSchema + Send,
    {
        let response: StructuredResponse<T> =
            <Self as LlmProvider>::create_structured_completion(self, request).await?;
        Ok(response)
    }

    /// Runs the tool calling loop until the model answers without tool calls.
    ///
    /// The registry's schemas replace `request.tools`. `tool_choice` defaults
    /// to `auto`. A failing tool aborts the loop with its error.
    #[tracing::instrument(
        name = "complete_with_tools",
        skip(self, request, tools),
        fields(model = %request.model, tools = tools.len()),
        err
    )]
    pub async fn complete_with_tools(
        &self,
        mut request: CompletionRequest,
        tools: &ToolRegistry,
    ) -> Result<ChatCompletion, LlmError> {
        let mut guard = ToolCallingGuard::from_config(&self.tool_calling_config);
        let is_parallel = request.parallel_tool_calls.unwrap_or(true);

        request.stream = false;
        request.tools = Some(tools.get_schemas());
        if request.tool_choice.is_none() && !tools.is_empty() {
            request.tool_choice = Some(ToolChoice::Auto);
        }

        loop {
            guard.increment_iteration()?;

            let completion = self.create_completion(request.clone()).await?;
            if !completion.has_tool_calls() {
                debug!(
                    iterations = guard.current_iteration(),
                    "No more tool calls, returning final response"
                );
                return Ok(completion);
            }

            let mut calls = completion.tool_calls;
            if !is_parallel {
                calls.truncate(1);
            }
            info!(
                count = calls.len(),
                iteration = guard.current_iteration(),
                "Model requested tool execution"
            );

            request.push_message(ConversationMessage::ToolCalls {
                content: (!completion.content.is_empty()).then_some(completion.content),
                tool_calls: calls.clone(),
            });

            for call in &calls {
                let result = tools.execute(call).await?;
                request.push_message(result);
            }
        }
    }
}

#[async_trait]
impl LlmProvider for ChatClient {
    async fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<ChatCompletion, LlmError> {
        ChatClient::create_completion(self, request).await
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, LlmError> {
        ChatClient::stream_completion(self, request).await
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<ImageGeneration, LlmError> {
        ChatClient::generate_image(self, request).await
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("credentials", &self.credentials)
            .field("tool_calling_config", &self.tool_calling_config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ChatClient`].
#[derive(Debug)]
pub struct ChatClientBuilder {
    credentials: Credentials,
    http_config: HttpClientConfig,
    inspector_config: InspectorConfig,
    tool_calling_config: ToolCallingConfig,
}

impl ChatClientBuilder {
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Called with the JSON body of every request before it is sent.
    pub fn inspect_request<F>(mut self, inspector: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inspector_config.request_inspector = Some(std::sync::Arc::new(inspector));
        self
    }

    /// Called with the JSON body of every non-streaming response, including error bodies.
    pub fn inspect_response<F>(mut self, inspector: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inspector_config.response_inspector = Some(std::sync::Arc::new(inspector));
        self
    }

    pub fn tool_calling_config(mut self, config: ToolCallingConfig) -> Self {
        self.tool_calling_config = config;
        self
    }

    pub fn build(self) -> Result<ChatClient, LlmError> {
        let http = HttpClient::new(&self.http_config, self.inspector_config)?;

        Ok(ChatClient {
            credentials: self.credentials,
            http,
            tool_calling_config: self.tool_calling_config,
        })
    }
}
