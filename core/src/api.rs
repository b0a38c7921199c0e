//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `challenge_stream_core::api` instead of reaching into internal modules.

pub use crate::config::{AppConfig, ControlConfig, LoggingConfig, SettingsConfig, TransportConfig};
pub use crate::error::{ConfigError, ParseError, RunError, StoreError, TransportError};
pub use crate::presentation::{GenerationSession, RunView};
pub use crate::protocol::{FrameDecoder, RawEvent, StreamEvent};
pub use crate::result::{reduce, ResultSnapshot, Statement};
pub use crate::run::{AbortToken, RunController, RunOptions, RunStatus, Step};
pub use crate::settings::{decode_stored, MemorySettingsStore, SettingsStore};
pub use crate::transport::{ByteStream, GenerationRequest, GenerationTransport};
