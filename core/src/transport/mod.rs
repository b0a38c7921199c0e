use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::TransportError;

mod request;

pub use request::GenerationRequest;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Opens the streaming generation request.
///
/// `open` resolves once the response headers are in: a non-success status must come
/// back as [`TransportError::Status`], never as a stream. Dropping the returned stream
/// aborts the request. A request torn down by the underlying client rather than by the
/// caller must surface as [`TransportError::Aborted`]; every other read failure fails the
/// run.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn open(&self, request: &GenerationRequest) -> Result<ByteStream, TransportError>;
}
