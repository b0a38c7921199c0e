// core/src/error/store_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings file unreadable: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file is not a json object: {path}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings value for {key} is not valid json")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
