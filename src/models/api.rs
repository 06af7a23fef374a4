use serde::{ Serialize, Deserialize };

/// Body of `POST /functions/v1/chat-ai`. Field names are camelCase on the wire.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "isImage", default)]
    pub is_image: bool,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// Non-streaming text reply.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "originalMessage")]
    pub original_message: String,
}

/// Image-mode reply. `image` is either a base64 data URL or a plain URL.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    pub message: String,
}

impl ImageResponse {
    pub fn new(image: String, message: String) -> Self {
        Self {
            kind: "image".to_string(),
            image,
            message,
        }
    }
}

/// Payload of one SSE `data:` line on the streaming path.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamEvent {
    pub fn chunk(text: String) -> Self {
        Self {
            chunk: Some(text),
            done: false,
            error: None,
        }
    }

    pub fn done() -> Self {
        Self {
            chunk: None,
            done: true,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            chunk: None,
            done: false,
            error: Some(message),
        }
    }
}

/// Every request failure collapses to HTTP 400 with this body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            success: false,
        }
    }
}
