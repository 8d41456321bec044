//! Remote transport seam and the form-urlencoded wire format

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::error::RemoteError;

/// Decoded remote answer: field name to `true` or a rejection.
pub type RemoteResponse = serde_json::Map<String, Value>;

/// Posts a form-urlencoded payload and returns the decoded JSON object.
///
/// Single-field and batched checks use the same call.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn post(&self, url: &str, payload: String) -> Result<RemoteResponse, RemoteError>;
}

/// Transport used when none is configured: every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTransport;

#[async_trait]
impl RemoteTransport for UnconfiguredTransport {
    async fn post(&self, url: &str, _payload: String) -> Result<RemoteResponse, RemoteError> {
        Err(RemoteError::Transport(format!(
            "no remote transport configured for '{url}'"
        )))
    }
}

// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encodes `name=value` pairs joined by `&`.
#[must_use]
pub fn encode_payload(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, COMPONENT),
                utf8_percent_encode(value, COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Decodes a response body, which must be a JSON object.
pub fn parse_response(body: &str) -> Result<RemoteResponse, RemoteError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(RemoteError::NotAnObject),
    }
}
