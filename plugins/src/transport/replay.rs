use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;

use challenge_stream_core::error::TransportError;
use challenge_stream_core::transport::{ByteStream, GenerationRequest, GenerationTransport};

/// Serves a recorded response body from disk in fixed-size chunks. Chunk boundaries
/// deliberately ignore frame and UTF-8 boundaries.
pub struct ReplayGenerationTransport {
    path: PathBuf,
    chunk_bytes: usize,
}

impl ReplayGenerationTransport {
    pub fn new(path: impl Into<PathBuf>, chunk_bytes: usize) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: chunk_bytes.max(1),
        }
    }
}

#[async_trait]
impl GenerationTransport for ReplayGenerationTransport {
    fn name(&self) -> &str {
        "replay"
    }

    async fn open(&self, request: &GenerationRequest) -> Result<ByteStream, TransportError> {
        let mut file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            TransportError::Connect(format!("cannot open {}: {e}", self.path.display()))
        })?;
        tracing::debug!(
            target: "challenge_stream.transport",
            path = %self.path.display(),
            brief_chars = request.brief_text.chars().count(),
            "replaying recorded stream"
        );

        let chunk_bytes = self.chunk_bytes;
        let stream = async_stream::stream! {
            let mut buf = vec![0u8; chunk_bytes];
            loop {
                match file.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => yield Ok(Bytes::copy_from_slice(&buf[..n])),
                    Err(e) => {
                        yield Err(TransportError::Read(e.to_string()));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
