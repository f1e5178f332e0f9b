//! Server-sent event encoding for the streaming path.

use std::convert::Infallible;

use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::http::HeaderName;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::{ErrorCode, ErrorPayload};
use crate::types::StreamEvent;

/// Wrap a sequenced event stream as an SSE response.
pub fn stream_response(events: BoxStream<'static, StreamEvent>) -> Response {
    let frames = events.map(|event| Ok::<_, Infallible>(frame(&event)));
    let mut response = Sse::new(frames)
        .keep_alive(KeepAlive::default())
        .into_response();
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

/// Encode one event as a `data:` frame.
fn frame(event: &StreamEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(data) => Event::default().data(data),
        Err(error) => {
            let payload = ErrorPayload {
                code: ErrorCode::ServerError,
                message: format!("failed to encode event: {error}"),
            };
            let fallback = serde_json::json!({ "type": "error", "error": payload });
            Event::default().data(fallback.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResponseHead, ResponseStatus};

    #[test]
    fn frames_carry_the_wire_event_name() {
        let event = StreamEvent::Created {
            sequence_number: 0,
            response: ResponseHead {
                id: "resp_1".to_string(),
                object: "response".to_string(),
                created_at: 0,
                model: "m1".to_string(),
                status: ResponseStatus::InProgress,
                temperature: None,
                top_p: None,
                max_output_tokens: None,
            },
        };
        let encoded = serde_json::to_string(&event).unwrap();
        assert!(encoded.contains(r#""type":"response.created""#));
    }
}
