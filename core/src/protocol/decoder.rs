use serde_json::{Map, Value};

use crate::error::ParseError;

/// One decoded frame: the `type` field plus the rest of the JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub kind: String,
    pub payload: Map<String, Value>,
}

/// Incremental frame decoder.
///
/// Chunks are appended to a byte buffer and complete frames (terminated by a blank line)
/// are cut off the front. Partial frames, including partial UTF-8 sequences, stay in the
/// buffer until the next chunk. A malformed frame is logged and skipped; it never
/// interrupts the frames around it.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    // Bytes already searched for a delimiter without success.
    scanned: usize,
    decoded: u64,
    malformed: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, delimiter)) = find_frame_end(&self.buffer, self.scanned) {
            let frame: Vec<u8> = self.buffer.drain(..end + delimiter).collect();
            self.scanned = 0;
            match parse_frame(&frame[..end]) {
                Ok(Some(event)) => {
                    self.decoded += 1;
                    events.push(event);
                }
                Ok(None) => {}
                Err(err) => {
                    self.malformed += 1;
                    tracing::warn!(
                        target: "challenge_stream.decoder",
                        error = %err,
                        bytes = end,
                        malformed_total = self.malformed,
                        "skipping malformed frame"
                    );
                }
            }
        }
        // Rescan the last two bytes; a delimiter may straddle two chunks.
        self.scanned = self.buffer.len().saturating_sub(2);
        events
    }

    /// Ends the stream. An unterminated trailing fragment is discarded; returns its size.
    pub fn finish(&mut self) -> usize {
        let leftover = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if leftover.iter().all(u8::is_ascii_whitespace) {
            return 0;
        }
        tracing::warn!(
            target: "challenge_stream.decoder",
            bytes = leftover.len(),
            "discarding unterminated frame at end of stream"
        );
        leftover.len()
    }

    pub fn decoded_count(&self) -> u64 {
        self.decoded
    }

    pub fn malformed_count(&self) -> u64 {
        self.malformed
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Finds the first blank-line delimiter (`\n\n` or `\n\r\n`) at or after `from`.
/// Returns the frame length and the delimiter length.
fn find_frame_end(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i < buf.len() {
        if buf[i] == b'\n' {
            match (buf.get(i + 1), buf.get(i + 2)) {
                (Some(b'\n'), _) => return Some((i, 2)),
                (Some(b'\r'), Some(b'\n')) => return Some((i, 3)),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn parse_frame(frame: &[u8]) -> Result<Option<RawEvent>, ParseError> {
    let text = std::str::from_utf8(frame).map_err(ParseError::InvalidUtf8)?;

    let mut data_lines: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if data_lines.is_empty() {
        return Ok(None);
    }

    let json = data_lines.join("\n");
    if json.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(json.trim()).map_err(ParseError::InvalidJson)?;
    let Value::Object(mut payload) = value else {
        return Err(ParseError::NotAnObject);
    };
    let kind = match payload.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(ParseError::MissingField("type")),
    };
    Ok(Some(RawEvent { kind, payload }))
}
