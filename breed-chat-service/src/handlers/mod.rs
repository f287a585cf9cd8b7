//! HTTP handlers for the breed chat service.
//!
//! Handlers parse the request, delegate to the prompt composer, registry or
//! model gateway, and map the outcome to a response. Failures carry the
//! localized error message; the cause is only logged.

pub mod chat;
pub mod generate;
pub mod health;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Decode a base64 image, accepting an optional `data:<mime>;base64,` prefix
/// and embedded whitespace.
pub(crate) fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64.decode(cleaned)
}
