//! Newline framing over the raw TCP byte stream.
//!
//! The server writes one JSON object per line, but a single read may return
//! part of a line or several lines at once. [`FrameReader`] buffers the stream
//! and hands out one trimmed, non-empty line at a time.

use crate::client::ClientError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

/// Capacity of the socket read buffer
pub const READ_BUFFER_SIZE: usize = 4096;

/// Pulls frames out of an async byte stream.
///
/// There is no bound on the length of a pending line.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(READ_BUFFER_SIZE, reader)
    }

    /// Reader whose socket reads are at most `capacity` bytes
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line: Vec::new(),
        }
    }

    /// Wait for the next frame.
    ///
    /// Fails with [`ClientError::ConnectionLost`] once the peer closes the
    /// stream; a trailing line without `\n` is discarded.
    pub async fn next_frame(&mut self) -> Result<String, ClientError> {
        loop {
            self.line.clear();
            let read = self.reader.read_until(b'\n', &mut self.line).await?;
            if read == 0 {
                return Err(ClientError::ConnectionLost);
            }
            if self.line.last() != Some(&b'\n') {
                warn!(
                    "Connection closed with {} bytes of an unfinished message",
                    self.line.len()
                );
                return Err(ClientError::ConnectionLost);
            }
            if let Some(frame) = decode_line(&self.line) {
                return Ok(frame);
            }
        }
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    match std::str::from_utf8(line) {
        Ok(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Err(e) => {
            warn!("Dropping frame that is not UTF-8: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn messages() -> Vec<&'static str> {
        vec![
            r#"{"Method":"Login","Args":null}"#,
            r#"{"Method":"Event","Args":{"MethodName":"Move","Player":"1","Direction":"UP"}}"#,
            r#"{"Method":"Help","Args":"Welcome"}"#,
        ]
    }

    fn stream_bytes() -> Vec<u8> {
        messages()
            .iter()
            .map(|m| format!("{}\n", m))
            .collect::<String>()
            .into_bytes()
    }

    async fn read_all(bytes: &[u8], capacity: usize) -> Vec<String> {
        let mut reader = FrameReader::with_capacity(capacity, bytes);
        let mut frames = Vec::new();
        loop {
            match reader.next_frame().await {
                Ok(frame) => frames.push(frame),
                Err(ClientError::ConnectionLost) => return frames,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
    }

    #[tokio::test]
    async fn test_any_read_size_yields_same_frames() {
        let bytes = stream_bytes();
        for size in 1..=bytes.len() {
            assert_eq!(read_all(&bytes, size).await, messages(), "read size {}", size);
        }
    }

    #[tokio::test]
    async fn test_blank_lines_and_whitespace() {
        let frames = read_all(b"\n  \r\n  {\"a\":1}  \r\n\n", 4).await;
        assert_eq!(frames, vec!["{\"a\":1}"]);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_reads() {
        let text = "{\"Help\":\"caf\u{e9}\"}\n".as_bytes();
        let at = text.iter().position(|&b| b == 0xC3).unwrap() + 1;

        // the buffer fills right after the first byte of the two-byte char
        let frames = read_all(text, at).await;
        assert_eq!(frames, vec!["{\"Help\":\"caf\u{e9}\"}"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_skipped() {
        let frames = read_all(&[0xFF, 0xFE, b'\n', b'o', b'k', b'\n'], 2).await;
        assert_eq!(frames, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_unfinished_line_is_dropped() {
        let frames = read_all(b"{\"Method\":\"Login\"}\n{\"Method\":", 8).await;
        assert_eq!(frames, vec![r#"{"Method":"Login"}"#]);
    }

    #[tokio::test]
    async fn test_reader_over_stream() {
        let (client, mut server) = tokio::io::duplex(16);

        let writer = tokio::spawn(async move {
            for byte_chunk in stream_bytes().chunks(7) {
                server.write_all(byte_chunk).await.unwrap();
            }
            server.write_all(b"{\"unfinished\"").await.unwrap();
        });

        let mut reader = FrameReader::new(client);
        for expected in messages() {
            assert_eq!(reader.next_frame().await.unwrap(), expected);
        }
        writer.await.unwrap();

        assert!(matches!(
            reader.next_frame().await,
            Err(ClientError::ConnectionLost)
        ));
    }
}
