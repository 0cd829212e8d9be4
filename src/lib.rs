//! # xai-client
//!
//! Typed access to xAI's chat completions: blocking and streaming text,
//! image generation and schema-validated structured output.
//!
//! Every call is a single request. Failures come back as an [`LlmError`]
//! whose variant says whether configuration, authentication, the transport,
//! the provider or the schema is at fault. Nothing is retried for you.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xai_client::{ChatClient, CompletionRequest, Message, completion_schema};
//!
//! #[completion_schema(name = "analysis")]
//! struct Analysis {
//!     sentiment: String,
//!     confidence: f32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ChatClient::from_env()?;
//!
//!     let completion = client
//!         .create_completion(CompletionRequest::with_default_model(vec![Message::user(
//!             "What is 2+2? Reply with the number only.",
//!         )]))
//!         .await?;
//!     println!("{}", completion.content);
//!
//!     let analysis = client
//!         .create_structured_completion::<Analysis>(CompletionRequest::with_default_model(vec![
//!             Message::user("Analyze: 'This library is amazing!'"),
//!         ]))
//!         .await?;
//!     println!("{} ({})", analysis.content.sentiment, analysis.content.confidence);
//!     Ok(())
//! }
//! ```

mod client;
pub mod completions;
pub mod constants;
pub mod core;
pub(crate) mod images;
pub mod structured;

pub use client::{ChatClient, ChatClientBuilder};
pub use completions::CompletionStream;
pub use crate::core::{
    ApiKey, ChatCompletion, ChatRole, CompletionRequest, ConversationMessage, Credentials,
    FinishReason, GenerationConfig, HttpClientConfig, ImageData, ImageGeneration, ImageRequest,
    ImageResponseFormat, LlmError, LlmProvider, Message, ResponseFormat, StreamDelta,
    StructuredResponse, Tool, ToolCall, ToolCallResult, ToolCallingConfig, ToolChoice,
    ToolFunction, ToolRegistry,
};
pub use structured::StructuredFormat;
pub use xai_client_macros::completion_schema;
