//! Resource service functions: one backend call per logical operation.
//!
//! These are plain `impl ApiClient` blocks grouped by resource. They never
//! touch the stores; [`crate::app::AppContext`] wraps them in the
//! started/succeeded/failed lifecycle.

pub mod auth;
pub mod images;
pub mod products;

use serde::Deserialize;

/// Text endpoints answer either with a JSON string, a `{ "url": ... }`
/// object, or bare text.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextResponse {
    Plain(String),
    Object { url: String },
}

pub(crate) fn extract_text(body: &str) -> Option<String> {
    let trimmed = body.trim();
    let value = match serde_json::from_str::<TextResponse>(trimmed) {
        Ok(TextResponse::Plain(s)) => s,
        Ok(TextResponse::Object { url }) => url,
        Err(_) if trimmed.starts_with('{') || trimmed.starts_with('[') => return None,
        Err(_) => trimmed.to_string(),
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
