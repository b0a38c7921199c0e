// core/src/error/parse_error.rs
use thiserror::Error;

/// Frame-level failures. These never fail a run; the decoder logs and skips them.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("frame is not valid utf-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    #[error("invalid json frame")]
    InvalidJson(#[source] serde_json::Error),

    #[error("frame payload is not a json object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("payload does not match event type: {kind}")]
    SchemaMismatch {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
