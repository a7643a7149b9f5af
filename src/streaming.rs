//! SSE streaming for chat completions.
//!
//! The completion text is produced up front, split into whitespace words,
//! and replayed as `chat.completion.chunk` frames with a configurable pause
//! between them. Every frame is `data: <json>\n\n`; a successful stream
//! ends with `data: [DONE]\n\n`. Errors inside the stream are reported as
//! an error frame since the 200 status is already on the wire, and the
//! stream ends there with no `[DONE]`.

use std::future::Future;
use std::io;
use std::time::Duration;

use actix_web::HttpResponse;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::protocols::{
    ChatCompletionRequest, ChatCompletionStreamResponse, ChatMessageDelta, ChatStreamChoice,
};
use crate::router::Backend;
use crate::state::AppState;

/// Split a completion into word chunks.
///
/// Each word becomes one delta carrying the word plus a trailing space, so
/// the concatenated deltas reconstruct the text with single spaces between
/// words. Only the final chunk carries `finish_reason: "stop"`; empty text
/// still yields one empty terminal chunk so clients always see a stop.
pub fn build_chunks(
    id: &str,
    created: i64,
    model: &str,
    text: &str,
) -> Vec<ChatCompletionStreamResponse> {
    let make = |delta: ChatMessageDelta, finish_reason: Option<String>| {
        ChatCompletionStreamResponse {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChatStreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![make(ChatMessageDelta::default(), Some("stop".to_string()))];
    }

    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let finish_reason = (i == last).then(|| "stop".to_string());
            make(
                ChatMessageDelta {
                    role: None,
                    content: Some(format!("{word} ")),
                },
                finish_reason,
            )
        })
        .collect()
}

fn frame(payload: &str) -> Bytes {
    Bytes::from(format!("data: {payload}\n\n"))
}

/// Route a streaming completion request through the shared state.
pub fn sse_response(
    state: AppState,
    backend: Backend,
    request: ChatCompletionRequest,
    temperature: f32,
) -> HttpResponse {
    let delay = Duration::from_millis(state.settings.stream_delay_ms);
    let model = request.model.clone();
    let generation = async move {
        state
            .generate_text(
                backend,
                &request.model,
                &request.messages,
                temperature,
                request.max_tokens,
            )
            .await
    };
    stream_completion(model, delay, generation)
}

/// Run the generation in a spawned task and stream the result as SSE.
///
/// A successful generation is chunked and terminated with `[DONE]`; a
/// failed one yields a single error frame and the stream ends there.
pub fn stream_completion<F>(model: String, delay: Duration, generation: F) -> HttpResponse
where
    F: Future<Output = Result<String, ApiError>> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<Result<Bytes, io::Error>>();

    tokio::spawn(async move {
        match generation.await {
            Ok(text) => {
                let id = format!("chatcmpl-{}", Uuid::new_v4());
                let created = Utc::now().timestamp();
                for chunk in build_chunks(&id, created, &model, &text) {
                    let payload = match serde_json::to_string(&chunk) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("failed to serialize stream chunk: {e}");
                            break;
                        }
                    };
                    if tx.send(Ok(frame(&payload))).is_err() {
                        // Client disconnected.
                        debug!("stream receiver dropped, aborting completion {id}");
                        return;
                    }
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                let _ = tx.send(Ok(Bytes::from_static(b"data: [DONE]\n\n")));
            }
            Err(e) => {
                warn!("streaming generation failed: {e}");
                let payload = json!({
                    "error": {
                        "message": e.to_string(),
                        "type": "internal_error",
                    }
                });
                let _ = tx.send(Ok(frame(&payload.to_string())));
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(UnboundedReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    async fn frames_of(resp: HttpResponse) -> Vec<String> {
        let body = to_bytes(resp.into_body()).await.unwrap();
        String::from_utf8(body.to_vec())
            .unwrap()
            .split("\n\n")
            .filter(|f| !f.is_empty())
            .map(|f| f.strip_prefix("data: ").unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn successful_stream_terminates_with_done() {
        let resp = stream_completion("local-tutor".to_string(), Duration::ZERO, async {
            Ok("Hello world".to_string())
        });
        let frames = frames_of(resp).await;
        assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));
        assert_eq!(frames.len(), 3);
    }

    #[tokio::test]
    async fn failed_generation_yields_one_error_frame_and_no_done() {
        let resp = stream_completion("deepseek-chat".to_string(), Duration::ZERO, async {
            Err(ApiError::Provider("connection refused".to_string()))
        });
        let frames = frames_of(resp).await;
        assert_eq!(frames.len(), 1);
        let payload: Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(payload["error"]["type"], "internal_error");
        assert!(payload["error"]["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }

    fn concat(chunks: &[ChatCompletionStreamResponse]) -> String {
        chunks
            .iter()
            .filter_map(|c| c.choices[0].delta.content.clone())
            .collect()
    }

    #[test]
    fn deltas_reassemble_the_text() {
        let chunks = build_chunks("chatcmpl-1", 0, "gpt-4-tutor", "Hello world again");
        assert_eq!(chunks.len(), 3);
        assert_eq!(concat(&chunks), "Hello world again ");
    }

    #[test]
    fn only_the_last_chunk_stops() {
        let chunks = build_chunks("chatcmpl-1", 0, "gpt-4-tutor", "one two three");
        let reasons: Vec<Option<String>> = chunks
            .iter()
            .map(|c| c.choices[0].finish_reason.clone())
            .collect();
        assert_eq!(reasons, vec![None, None, Some("stop".to_string())]);
    }

    #[test]
    fn id_and_created_are_stable_within_a_completion() {
        let chunks = build_chunks("chatcmpl-abc", 1700000000, "gpt-4-tutor", "a b c");
        for chunk in &chunks {
            assert_eq!(chunk.id, "chatcmpl-abc");
            assert_eq!(chunk.created, 1700000000);
            assert_eq!(chunk.object, "chat.completion.chunk");
        }
    }

    #[test]
    fn empty_text_yields_single_stop_chunk() {
        let chunks = build_chunks("chatcmpl-1", 0, "gpt-4-tutor", "");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].choices[0].delta.content.is_none());
        assert_eq!(chunks[0].choices[0].finish_reason.as_deref(), Some("stop"));

        let whitespace = build_chunks("chatcmpl-1", 0, "gpt-4-tutor", "   ");
        assert_eq!(whitespace.len(), 1);
    }

    #[test]
    fn runs_of_whitespace_collapse() {
        let chunks = build_chunks("chatcmpl-1", 0, "gpt-4-tutor", "Hello\n\n  world");
        assert_eq!(concat(&chunks), "Hello world ");
    }
}
