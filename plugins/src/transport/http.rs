use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use challenge_stream_core::config::HttpTransportConfig;
use challenge_stream_core::error::TransportError;
use challenge_stream_core::transport::{ByteStream, GenerationRequest, GenerationTransport};

/// POSTs the request as JSON and exposes the response body as a byte stream.
pub struct HttpGenerationTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerationTransport {
    pub fn new(cfg: &HttpTransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Read(err.to_string())
    }
}

#[async_trait]
impl GenerationTransport for HttpGenerationTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self, request: &GenerationRequest) -> Result<ByteStream, TransportError> {
        let body = request.to_json_bytes()?;
        tracing::debug!(
            target: "challenge_stream.transport",
            endpoint = %self.endpoint,
            body_bytes = body.len(),
            "posting generation request"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            // The error body is best effort; the status alone still yields a message.
            let body = resp.bytes().await.unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), &body));
        }
        if resp.content_length() == Some(0) {
            return Err(TransportError::EmptyBody);
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Read(e.to_string())));
        Ok(Box::pin(stream))
    }
}
