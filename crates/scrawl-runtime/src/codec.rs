//! Provider payload encoding and response field extraction.
//!
//! Request bodies are built with `serde` derive structs (each backend owns
//! its shape); responses are NOT parsed as JSON. Extraction scans for a
//! single known field label and returns the raw string token behind it,
//! escape sequences and all.
//!
//! The scanning contract is load-bearing for wire compatibility: it
//! deliberately does not decode `\n`, `\"` and friends back to literal
//! characters, and it finds the first occurrence of the label anywhere in
//! the body. Do not replace it with a structural parser without revisiting
//! every backend's field table.

use thiserror::Error;

/// Errors from payload decoding and provider status handling.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("response field \"{0}\" not found")]
    MissingField(&'static str),

    #[error("unterminated string value for field \"{0}\"")]
    UnterminatedField(&'static str),

    #[error("request encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Extract the first string value labeled `"label":` from `body`.
///
/// The scan advances to the first `"` after the label, then walks forward
/// tracking backslash run parity to find the terminating unescaped quote.
/// The returned slice is the raw token between the quotes, verbatim.
pub fn extract_string_field<'a>(
    body: &'a str,
    label: &'static str,
) -> Result<&'a str, ProtocolError> {
    let marker = format!("\"{label}\":");
    let start = body
        .find(&marker)
        .ok_or(ProtocolError::MissingField(label))?;
    let after_label = &body[start + marker.len()..];

    let open = after_label
        .find('"')
        .ok_or(ProtocolError::MissingField(label))?;
    let value = &after_label[open + 1..];

    let bytes = value.as_bytes();
    let mut backslash_run = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\\' => backslash_run += 1,
            b'"' if backslash_run % 2 == 0 => return Ok(&value[..i]),
            _ => backslash_run = 0,
        }
    }

    Err(ProtocolError::UnterminatedField(label))
}
