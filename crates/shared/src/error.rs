//! Shared error types and backend error-body decoding.

use serde_json::Value;
use thiserror::Error;

/// Attempt to extract a user-facing message from a backend error body.
///
/// Tries, in order: an object's `message` field, a bare JSON string, a
/// field-to-message validation map (joined as `field: message`), and finally
/// the raw text when it is not JSON at all.
pub fn try_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Object(map) => {
            if let Some(Value::String(msg)) = map.get("message") {
                if !msg.trim().is_empty() {
                    return Some(msg.clone());
                }
            }
            let fields: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| v.as_str().map(|msg| format!("{field}: {msg}")))
                .collect();
            if fields.is_empty() {
                None
            } else {
                Some(fields.join(", "))
            }
        }
        _ => None,
    }
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP 400 with the backend's field errors, kept verbatim.
    #[error("Validation error: {body}")]
    Validation { body: String },
    /// HTTP 401. The session has been torn down by the time this is seen.
    #[error("Unauthorized: {body}")]
    Unauthorized { body: String },
    #[error("Not found: {body}")]
    NotFound { body: String },
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    /// A client-side check failed before any request was sent.
    #[error("{0}")]
    Precondition(String),
}

impl ApiError {
    /// Map a non-success status and its body onto the taxonomy.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => ApiError::Validation { body },
            401 => ApiError::Unauthorized { body },
            404 => ApiError::NotFound { body },
            _ => ApiError::Http { status, body },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { .. } => Some(400),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// The message to show the user, falling back to `default` when the
    /// backend said nothing useful.
    pub fn message_or(&self, default: &str) -> String {
        match self {
            ApiError::Precondition(msg) => msg.clone(),
            ApiError::Validation { body }
            | ApiError::Unauthorized { body }
            | ApiError::NotFound { body }
            | ApiError::Http { body, .. } => {
                try_error_message(body).unwrap_or_else(|| default.to_string())
            }
            ApiError::Network(_) | ApiError::Deserialize(_) => default.to_string(),
        }
    }
}
