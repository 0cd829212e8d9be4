//! Chat completions wire format and streaming.
//!
//! Requests and responses follow the OpenAI-compatible `/chat/completions`
//! shape served by xAI.

pub(crate) mod request;
pub(crate) mod response;
mod stream;

pub use stream::CompletionStream;
