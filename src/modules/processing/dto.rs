use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

/// Push envelope delivered by the message broker.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PushRequest {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PushMessage {
    /// Base64-encoded JSON payload, e.g. `{"name": "clip.mp4"}`.
    pub data: String,
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Decoded payload.
#[derive(Debug, Deserialize, Validate)]
pub struct VideoMessage {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Envelope(serde_json::Error),

    #[error("message data is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("message data is not valid JSON: {0}")]
    Payload(serde_json::Error),

    #[error("invalid message: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl PushRequest {
    pub fn parse(body: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(body).map_err(DecodeError::Envelope)
    }

    pub fn decode_message(&self) -> Result<VideoMessage, DecodeError> {
        let raw = STANDARD.decode(self.message.data.trim())?;
        let message: VideoMessage = serde_json::from_slice(&raw).map_err(DecodeError::Payload)?;
        message.validate()?;
        Ok(message)
    }
}

/// Envelope bytes to a validated message. No side effects.
pub fn decode_video_message(body: &[u8]) -> Result<VideoMessage, DecodeError> {
    PushRequest::parse(body)?.decode_message()
}
