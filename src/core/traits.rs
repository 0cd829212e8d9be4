use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::completions::CompletionStream;
use crate::structured;

use super::{
    error::LlmError,
    types::{
        ChatCompletion, CompletionRequest, ImageGeneration, ImageRequest, ResponseMetadata,
        StructuredResponse, Tool,
    },
};

/// The operations a chat provider offers.
///
/// `ChatClient` is the HTTP implementation. Code that needs a provider should
/// take `&impl LlmProvider` (or `&dyn LlmProvider`) so a different
/// implementation can be injected.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn create_completion(&self, request: CompletionRequest)
    -> Result<ChatCompletion, LlmError>;

    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, LlmError>;

    async fn generate_image(&self, request: ImageRequest) -> Result<ImageGeneration, LlmError>;

    /// Requests JSON matching the schema of `T`, then validates and decodes it.
    async fn create_structured_completion<T>(
        &self,
        request: CompletionRequest,
    ) -> Result<StructuredResponse<T>, LlmError>
    where
        Self: Sized,
        T: DeserializeOwned + schemars::JsonSchema + Send,
    {
        let format = structured::StructuredFormat::for_type::<T>()?;
        let request = CompletionRequest {
            stream: false,
            response_format: Some(format.response_format()),
            ..request
        };

        let completion = self.create_completion(request).await?;
        if let Some(refusal) = completion.refusal {
            return Err(LlmError::provider(format!("Model refused: {refusal}")));
        }

        let content = format.parse::<T>(&completion.content)?;

        Ok(StructuredResponse {
            content,
            usage: completion.usage,
            metadata: ResponseMetadata {
                id: completion.id,
                model: completion.model,
            },
        })
    }
}

/// A function the model can call through `ChatClient::complete_with_tools`.
#[async_trait]
pub trait ToolFunction: Send + Sync {
    fn schema(&self) -> Tool;

    async fn execute(&self, arguments: Value) -> Result<Value, LlmError>;
}
