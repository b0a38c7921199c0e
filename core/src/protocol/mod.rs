//! Wire protocol of the generation endpoint: `data: {json}` frames separated by a
//! blank line, each carrying one typed event.

pub mod decoder;
pub mod event;

pub use decoder::{FrameDecoder, RawEvent};
pub use event::{DiagnosticPayload, EvaluationPayload, StreamEvent};
