// core/src/error/transport_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-2xx response. `message` already prefers the server `detail` field.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("failed to reach generation endpoint: {0}")]
    Connect(String),

    #[error("stream read failed: {0}")]
    Read(String),

    #[error("Response body is empty")]
    EmptyBody,

    #[error("request encode error")]
    Encode(#[source] serde_json::Error),

    /// The request was aborted below the controller (e.g. the connection was torn down
    /// by the client library). Not a run failure.
    #[error("request aborted")]
    Aborted,
}

impl TransportError {
    pub fn is_abort(&self) -> bool {
        matches!(self, TransportError::Aborted)
    }

    /// Message for a non-success status, preferring the server-supplied `detail`.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .and_then(|d| match d {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) if s.trim().is_empty() => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            });
        TransportError::Status {
            status,
            message: detail.unwrap_or_else(|| format!("API request failed: {status}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefers_server_detail() {
        let err = TransportError::from_status(422, br#"{"detail":"brief_text is required"}"#);
        assert_eq!(err.to_string(), "brief_text is required");
    }

    #[test]
    fn status_falls_back_to_generic_message() {
        let err = TransportError::from_status(502, b"<html>bad gateway</html>");
        assert_eq!(err.to_string(), "API request failed: 502");

        let err = TransportError::from_status(500, br#"{"detail":null}"#);
        assert_eq!(err.to_string(), "API request failed: 500");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let err = TransportError::from_status(422, br#"{"detail":[{"loc":["body"]}]}"#);
        assert_eq!(err.to_string(), r#"[{"loc":["body"]}]"#);
    }
}
