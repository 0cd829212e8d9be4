//! Lazy decoding of `text/event-stream` chat completion bodies.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::completions::response::ChatChunk;
use crate::core::{LlmError, StreamDelta, http::describe_error_payload};

const DONE_SENTINEL: &str = "[DONE]";
const EVENT_STREAM: &str = "text/event-stream";

/// Content fragments of a streaming completion, in arrival order.
///
/// The stream is finite and cannot be restarted. It ends after `data: [DONE]`,
/// at the end of the body, or right after the first error it yields.
/// Dropping it (or calling [`close`](Self::close)) releases the connection.
pub struct CompletionStream {
    body: Option<BoxStream<'static, Result<Bytes, LlmError>>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<StreamDelta, LlmError>>,
    saw_event: bool,
}

impl CompletionStream {
    /// Fails instead of opening a stream when the body is declared as something
    /// other than `text/event-stream`.
    pub(crate) async fn from_response(response: reqwest::Response) -> Result<Self, LlmError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        if let Some(content_type) = content_type.filter(|ct| !ct.starts_with(EVENT_STREAM)) {
            return Err(non_stream_body_error(response, &content_type).await);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LlmError::transport("Stream read failed", e)));
        Ok(Self::from_byte_stream(body))
    }

    pub(crate) fn from_byte_stream<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, LlmError>> + Send + 'static,
    {
        Self {
            body: Some(body.boxed()),
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            saw_event: false,
        }
    }

    /// Stops the stream and drops the underlying connection.
    pub fn close(&mut self) {
        self.body = None;
        self.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.body.is_none() && self.pending.is_empty()
    }

    /// Drains the stream into the full response text.
    pub async fn collect_text(mut self) -> Result<String, LlmError> {
        let mut text = String::new();
        while let Some(delta) = self.next().await {
            text.push_str(&delta?.delta);
        }
        Ok(text)
    }

    fn drain_events(&mut self) {
        while let Some(data) = self.decoder.next_event() {
            self.saw_event = true;
            if data.trim() == DONE_SENTINEL {
                tracing::debug!("Stream completed");
                self.body = None;
                return;
            }

            let parsed = serde_json::from_str::<ChatChunk>(&data)
                .map_err(|e| LlmError::parse("Failed to parse stream chunk", e))
                .and_then(ChatChunk::into_delta);

            match parsed {
                Ok(Some(delta)) => self.pending.push_back(Ok(delta)),
                Ok(None) => {}
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.body = None;
                    return;
                }
            }
        }
    }
}

impl Stream for CompletionStream {
    type Item = Result<StreamDelta, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                if item.is_err() {
                    this.close();
                }
                return Poll::Ready(Some(item));
            }

            let Some(body) = this.body.as_mut() else {
                return Poll::Ready(None);
            };

            match body.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(bytes))) => {
                    this.decoder.push(&bytes);
                    this.drain_events();
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Stream interrupted");
                    this.close();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.body = None;
                    // Flush an event the server did not terminate with a blank line.
                    this.decoder.push(b"\n\n");
                    this.drain_events();

                    if !this.saw_event && this.decoder.saw_foreign_lines {
                        tracing::warn!("Stream body ended without any server-sent event");
                        this.pending.push_back(Err(LlmError::parse(
                            "Failed to parse stream",
                            "response body is not a server-sent event stream",
                        )));
                    }
                }
            }
        }
    }
}

impl fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStream")
            .field("open", &self.body.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Splits a byte stream into SSE events and returns their joined `data` fields.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
    /// Set once a line that is not an SSE field was skipped.
    saw_foreign_lines: bool,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn next_event(&mut self) -> Option<String> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data_lines.is_empty() {
                    return Some(std::mem::take(&mut self.data_lines).join("\n"));
                }
                continue;
            }

            // Comment / keep-alive
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "data" => self.data_lines.push(value.to_string()),
                "event" | "id" | "retry" => {}
                _ => self.saw_foreign_lines = true,
            }
        }
        None
    }
}

/// Error for a successful response that is not an event stream.
///
/// An `{"error": ...}` payload is reported as a provider error, anything else
/// as a parse error.
async fn non_stream_body_error(response: reqwest::Response, content_type: &str) -> LlmError {
    let status = response.status();
    tracing::warn!(%status, content_type, "Expected an event stream");

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return LlmError::transport("Failed to read response body", e),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(payload) if payload.get("error").is_some() => {
            let (message, code) = describe_error_payload(&payload);
            LlmError::Provider {
                message: message.unwrap_or_else(|| "Stream rejected by provider".to_string()),
                status_code: Some(status.as_u16()),
                code,
            }
        }
        _ => LlmError::parse(
            "Failed to parse stream",
            format!("expected `{EVENT_STREAM}`, got `{content_type}`"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FinishReason;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Byte source that records when it is dropped.
    struct TrackedBody {
        chunks: VecDeque<Result<Bytes, LlmError>>,
        closed: Arc<AtomicBool>,
    }

    impl Stream for TrackedBody {
        type Item = Result<Bytes, LlmError>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Ready(self.get_mut().chunks.pop_front())
        }
    }

    impl Drop for TrackedBody {
        fn drop(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn tracked(chunks: Vec<Result<&'static str, LlmError>>) -> (CompletionStream, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let body = TrackedBody {
            chunks: chunks
                .into_iter()
                .map(|chunk| chunk.map(|s| Bytes::from_static(s.as_bytes())))
                .collect(),
            closed: Arc::clone(&closed),
        };
        (CompletionStream::from_byte_stream(body), closed)
    }

    fn chunk(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": content } }] })
        )
    }

    fn leak(s: String) -> &'static str {
        Box::leak(s.into_boxed_str())
    }

    #[tokio::test]
    async fn fragments_arrive_in_order_and_concatenate() {
        let (stream, _) = tracked(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n"),
            Ok(leak(chunk("The answer"))),
            Ok(leak(chunk(" is "))),
            Ok(leak(chunk("42."))),
            Ok("data: [DONE]\n\n"),
        ]);

        assert_eq!(stream.collect_text().await.unwrap(), "The answer is 42.");
    }

    #[tokio::test]
    async fn events_split_across_reads_and_crlf_are_decoded() {
        let full = chunk("héllo").replace('\n', "\r\n");
        let (head, tail) = full.split_at(12);
        let (stream, _) = tracked(vec![Ok(leak(head.to_string())), Ok(leak(tail.to_string()))]);

        let deltas: Vec<_> = stream.collect().await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap().delta, "héllo");
    }

    #[tokio::test]
    async fn finish_reason_and_unterminated_last_event_are_delivered() {
        let (mut stream, _) = tracked(vec![
            Ok(": keep-alive\n\n"),
            Ok(leak(chunk("hi"))),
            Ok("data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}"),
        ]);

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "hi");
        let last = stream.next().await.unwrap().unwrap();
        assert_eq!(last.delta, "");
        assert_eq!(last.finish_reason, Some(FinishReason::Stop));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_after_first_fragment_releases_connection() {
        let (mut stream, closed) = tracked(vec![
            Ok(leak(chunk("first"))),
            Ok(leak(chunk("second"))),
            Ok(leak(chunk("third"))),
        ]);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.delta, "first");
        assert!(!closed.load(Ordering::SeqCst));

        drop(stream);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn close_releases_connection_and_ends_stream() {
        let (mut stream, closed) = tracked(vec![Ok(leak(chunk("a"))), Ok(leak(chunk("b")))]);

        stream.next().await.unwrap().unwrap();
        stream.close();

        assert!(closed.load(Ordering::SeqCst));
        assert!(stream.is_closed());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn done_sentinel_releases_connection_immediately() {
        let (mut stream, closed) = tracked(vec![
            Ok(leak(format!("{}data: [DONE]\n\n", chunk("only")))),
            Ok(leak(chunk("ignored"))),
        ]);

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "only");
        assert!(closed.load(Ordering::SeqCst));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn transport_failure_terminates_stream() {
        let (mut stream, closed) = tracked(vec![
            Ok(leak(chunk("partial"))),
            Err(LlmError::transport("Stream read failed", "connection reset")),
            Ok(leak(chunk("never"))),
        ]);

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "partial");
        assert!(stream.next().await.unwrap().unwrap_err().is_transport());
        assert!(closed.load(Ordering::SeqCst));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn plain_json_body_is_a_parse_error_not_an_empty_stream() {
        let (mut stream, _) = tracked(vec![Ok(
            r#"{"error":{"message":"Model grok-x does not exist","code":"invalid_model"}}"#,
        )]);

        assert!(matches!(
            stream.next().await,
            Some(Err(LlmError::Parse { .. }))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_stream() {
        let (stream, _) = tracked(vec![Ok(": ping\n\n")]);
        assert_eq!(stream.collect_text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn malformed_chunk_is_a_parse_error() {
        let (mut stream, _) = tracked(vec![Ok("data: {oops\n\n"), Ok(leak(chunk("never")))]);

        assert!(matches!(
            stream.next().await,
            Some(Err(LlmError::Parse { .. }))
        ));
        assert!(stream.next().await.is_none());
    }
}
