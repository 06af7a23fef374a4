use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{ header, HeaderMap, Method, StatusCode },
    response::{ sse::{ Event, Sse }, IntoResponse, Response },
    routing::any,
    Json,
    Router,
};
use chrono::Utc;
use futures::StreamExt;
use log::{ info, warn };
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::agent::ChatAgent;
use crate::models::api::{ ChatRequest, ChatResponse, ErrorResponse, StreamEvent };

#[derive(Clone)]
struct AppState {
    agent: Arc<ChatAgent>,
}

/// Chat endpoint plus the static UI. CORS is wide open and answers preflight
/// for every route, matching the original deployment.
pub fn build_router(agent: Arc<ChatAgent>, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/functions/v1/chat-ai", any(chat_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(AppState { agent })
}

async fn chat_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, "ok").into_response();
    }
    if method != Method::POST {
        return bad_request(format!("Method {} not allowed", method));
    }

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(message) => {
            warn!("Rejecting request: {}", message);
            return bad_request(message);
        }
    };

    let session_id = request.session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(
        "Request received: session={}, is_image={}, message={:?}",
        session_id,
        request.is_image,
        request.message
    );

    if request.is_image {
        return match state.agent.generate_image(&session_id, &request.message).await {
            Ok(image) => Json(image).into_response(),
            Err(e) => bad_request(e.to_string()),
        };
    }

    if wants_event_stream(&headers) {
        stream_response(Arc::clone(&state.agent), session_id, request.message).await
    } else {
        match state.agent.collect_message(&session_id, &request.message).await {
            Ok(full) =>
                Json(ChatResponse {
                    message: full,
                    timestamp: Utc::now().to_rfc3339(),
                    kind: "text".to_string(),
                    original_message: request.message,
                }).into_response(),
            Err(e) => bad_request(e.to_string()),
        }
    }
}

/// Body validation mirrors the original handler: distinct messages for a
/// missing body, unparseable JSON, and a missing/non-string `message` field,
/// all collapsing to the same 400 shape.
fn parse_request(body: &[u8]) -> Result<ChatRequest, String> {
    if body.is_empty() {
        return Err("Missing request body".to_string());
    }
    let value: serde_json::Value = serde_json
        ::from_slice(body)
        .map_err(|_| "Invalid JSON in request body".to_string())?;
    if !value.get("message").map(|m| m.is_string()).unwrap_or(false) {
        return Err("Message must be a string".to_string());
    }
    serde_json::from_value(value).map_err(|_| "Invalid JSON in request body".to_string())
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// SSE stream of `data: {"chunk":…,"done":false}` events, terminated by
/// `data: {"done":true}`. A generation error surfaces as a final
/// `data: {"error":…}` event and the stream closes without the done marker.
async fn stream_response(agent: Arc<ChatAgent>, session_id: String, message: String) -> Response {
    let mut chunks = agent.stream_message(&session_id, &message).await;
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(32);

    tokio::spawn(async move {
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    let Ok(event) = Event::default().json_data(StreamEvent::chunk(chunk)) else {
                        continue;
                    };
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    if let Ok(event) = Event::default().json_data(StreamEvent::error(e.to_string())) {
                        let _ = tx.send(Ok(event)).await;
                    }
                    return;
                }
            }
        }
        if let Ok(done) = Event::default().json_data(StreamEvent::done()) {
            let _ = tx.send(Ok(done)).await;
        }
    });

    let sse = Sse::new(ReceiverStream::new(rx));
    ([(header::CACHE_CONTROL, "no-cache")], sse).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_empty_body() {
        assert_eq!(parse_request(b""), Err("Missing request body".to_string()));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert_eq!(
            parse_request(b"{not json"),
            Err("Invalid JSON in request body".to_string())
        );
    }

    #[test]
    fn parse_rejects_non_string_message() {
        assert_eq!(
            parse_request(br#"{"message":42}"#),
            Err("Message must be a string".to_string())
        );
        assert_eq!(
            parse_request(br#"{"isImage":true}"#),
            Err("Message must be a string".to_string())
        );
    }

    #[test]
    fn parse_accepts_well_formed_body() {
        let request = parse_request(br#"{"message":"hi","isImage":false}"#).unwrap();
        assert_eq!(request.message, "hi");
        assert!(!request.is_image);
    }

    #[test]
    fn accept_header_detection() {
        let mut headers = HeaderMap::new();
        assert!(!wants_event_stream(&headers));

        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        assert!(!wants_event_stream(&headers));

        headers.insert(header::ACCEPT, "text/event-stream".parse().unwrap());
        assert!(wants_event_stream(&headers));
    }
}
