//! Channel transports
//!
//! A [`Transport`] carries one JSON-RPC frame per message. Two flavours are
//! provided: newline-delimited JSON over any async byte stream (stdio, or an
//! in-memory duplex in tests) and WebSocket text frames.
//!
//! Frames are handed over as raw bytes. Checking that they are UTF-8 JSON is
//! the session's job, so malformed input gets a parse error instead of
//! ending the channel.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{McpError, Result};

/// A bidirectional frame channel owned by exactly one session
#[async_trait]
pub trait Transport: Send {
    /// Next inbound frame; `None` once the peer has closed the channel
    async fn recv(&mut self) -> Option<Result<Vec<u8>>>;

    /// Write one outbound frame
    async fn send(&mut self, frame: String) -> Result<()>;
}

// ==================== Newline-delimited JSON ====================

/// One frame per line over an async reader/writer pair
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    line: Vec<u8>,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a transport over a buffered reader and a writer
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: Vec::new(),
        }
    }
}

impl LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Transport over the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line).await {
                Ok(0) => return None,
                Ok(_) => {
                    let frame = self.line.trim_ascii();
                    if frame.is_empty() {
                        continue;
                    }
                    return Some(Ok(frame.to_vec()));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

// ==================== WebSocket ====================

/// One frame per WebSocket text message
pub struct WebSocketTransport {
    socket: WebSocket,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn recv(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            let message = match self.socket.recv().await? {
                Ok(message) => message,
                Err(e) => {
                    return Some(Err(McpError::TransportError {
                        message: e.to_string(),
                    }
                    .into()))
                }
            };

            match message {
                Message::Text(text) => return Some(Ok(text.into_bytes())),
                Message::Binary(data) => return Some(Ok(data)),
                Message::Close(_) => {
                    tracing::debug!("peer sent close frame");
                    return None;
                }
                // Pings are answered by the socket itself
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.socket
            .send(Message::Text(frame))
            .await
            .map_err(|e| {
                McpError::TransportError {
                    message: e.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_transport_skips_blank_lines() {
        let input: &[u8] = b"{\"a\":1}\n\n   \n{\"b\":2}\r\n";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.recv().await.unwrap().unwrap(), b"{\"a\":1}");
        assert_eq!(transport.recv().await.unwrap().unwrap(), b"{\"b\":2}");
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_line_transport_passes_invalid_utf8_through() {
        let input: &[u8] = b"{\"x\":\"\xff\xfe\"}\n{\"b\":2}\n";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.recv().await.unwrap().unwrap(), b"{\"x\":\"\xff\xfe\"}");
        assert_eq!(transport.recv().await.unwrap().unwrap(), b"{\"b\":2}");
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_line_transport_writes_one_line_per_frame() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        transport.send("{\"id\":1}".to_string()).await.unwrap();
        transport.send("{\"id\":2}".to_string()).await.unwrap();
        assert_eq!(transport.writer, b"{\"id\":1}\n{\"id\":2}\n");
    }

    #[tokio::test]
    async fn test_line_transport_with_mock_io() {
        let reader = tokio_test::io::Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .build();
        let writer = tokio_test::io::Builder::new().write(b"{}\n").build();
        let mut transport = LineTransport::new(BufReader::new(reader), writer);

        let frame = transport.recv().await.unwrap().unwrap();
        assert!(String::from_utf8(frame).unwrap().contains("ping"));
        transport.send("{}".to_string()).await.unwrap();
        assert!(transport.recv().await.is_none());
    }
}
