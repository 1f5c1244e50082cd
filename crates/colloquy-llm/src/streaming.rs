use std::collections::VecDeque;

use anyhow::Result;
use futures::StreamExt;
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::traits::FragmentStream;

/// One SSE chunk of an OpenAI-compatible chat completions stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Backends omit delta fields rather than sending nulls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatStreamChunk {
    /// Content delta carried by this chunk, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn is_done(&self) -> bool {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_ref())
            .is_some()
    }
}

/// Byte buffer that hands out complete `\n`-terminated lines.
///
/// SSE chunks arrive at arbitrary byte boundaries; lines must be reassembled
/// before parsing.
pub(crate) struct LineBuffer {
    bytes: VecDeque<u8>,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend(chunk);
    }

    /// Next complete line, trimmed; None until a full line is buffered.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline = self.bytes.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=newline).collect();

        match std::str::from_utf8(&line) {
            Ok(s) => Some(Ok(s.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8 in stream: {}", e))),
        }
    }
}

/// Turn an SSE HTTP response into a stream of content fragments.
///
/// Parses `data: ` lines, ends normally on the `[DONE]` sentinel, and skips
/// non-JSON lines some backends interleave. A transport error mid-stream
/// surfaces as an error item and terminates the stream.
pub fn parse_sse_stream(response: Response) -> FragmentStream {
    let byte_stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(byte_stream);
        let mut buffer = LineBuffer::with_capacity(4096);

        'outer: while let Some(chunk_result) = chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream connection error: {}", e));
                    break;
                }
            };

            buffer.extend(&bytes);

            while let Some(line_result) = buffer.next_line() {
                let line = match line_result {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(e);
                        break 'outer;
                    }
                };

                if line.is_empty() {
                    continue;
                }

                if let Some(data) = line.strip_prefix("data: ") {
                    if data.trim() == "[DONE]" {
                        break 'outer;
                    }

                    match serde_json::from_str::<ChatStreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(content) = chunk.content() {
                                if !content.is_empty() {
                                    yield Ok(content.to_string());
                                }
                            }
                            if chunk.is_done() {
                                break 'outer;
                            }
                        }
                        Err(_) => {
                            // Some backends interleave non-JSON keepalive lines
                            tracing::debug!("Skipping non-JSON stream line: {}", &line[..line.len().min(50)]);
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_basic() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn test_line_buffer_partial_line() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_chunk_content_extraction() {
        let json = r#"{"choices":[{"index":0,"delta":{"role":null,"content":"Hel"},"finish_reason":null}]}"#;
        let chunk: ChatStreamChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.content(), Some("Hel"));
        assert!(!chunk.is_done());
    }

    #[test]
    fn test_chunk_done_detection() {
        let json = r#"{"choices":[{"index":0,"delta":{"role":null,"content":null},"finish_reason":"stop"}]}"#;
        let chunk: ChatStreamChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.content(), None);
        assert!(chunk.is_done());
    }
}
