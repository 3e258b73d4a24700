use crate::messages::Message;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, instrument, trace, warn};

// Wire protocol constants
pub const MAX_LINE_LENGTH: usize = 512; // Including the CRLF terminator
pub const LINE_TERMINATOR: &str = "\r\n";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for line framing and connection establishment
#[derive(Debug, Clone)]
pub struct WireConfig {
    pub max_line_length: usize,
    pub connect_timeout: Duration,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl WireConfig {
    /// Create a WireConfig with a custom line limit and the default connect timeout
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            ..Self::default()
        }
    }
}

/// Errors raised while framing, parsing or transporting messages
#[derive(Error, Debug)]
pub enum WireProtocolError {
    #[error("Message too large: {size} bytes exceeds maximum of {max_size} bytes")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Malformed message: {reason}")]
    Malformed { reason: String },

    #[error("Invalid UTF-8 in message line: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Unexpected end of file while reading {operation}")]
    UnexpectedEof { operation: String },

    #[error("Connection closed")]
    Closed,

    #[error("Connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireProtocolError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        WireProtocolError::Malformed {
            reason: reason.into(),
        }
    }

    /// True when only the offending message is lost and the stream itself is
    /// still usable.
    pub fn is_message_level(&self) -> bool {
        matches!(
            self,
            WireProtocolError::MessageTooLarge { .. }
                | WireProtocolError::Malformed { .. }
                | WireProtocolError::InvalidUtf8(_)
        )
    }
}

/// Reads CRLF (or bare LF) terminated lines and parses them into messages
pub struct MessageReader<R> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
    max_line_length: usize,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R, config: &WireConfig) -> Self {
        Self {
            reader: BufReader::new(reader),
            buffer: Vec::with_capacity(config.max_line_length),
            max_line_length: config.max_line_length,
        }
    }

    /// Read the next non-empty line and parse it.
    ///
    /// An over-long line is consumed up to its terminator before
    /// `MessageTooLarge` is returned, so the next call starts on a fresh line.
    /// Not cancel safe: a partially read line is lost if the future is dropped.
    #[instrument(level = "trace", skip(self))]
    pub async fn read_message(&mut self) -> Result<Message, WireProtocolError> {
        loop {
            self.buffer.clear();
            let limit = self.max_line_length as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buffer)
                .await?;

            if read == 0 {
                return Err(WireProtocolError::UnexpectedEof {
                    operation: "message line".to_string(),
                });
            }

            if self.buffer.last() != Some(&b'\n') {
                if read >= self.max_line_length {
                    warn!(
                        size = read,
                        max_size = self.max_line_length,
                        "Inbound line exceeds maximum length"
                    );
                    self.discard_line().await?;
                    return Err(WireProtocolError::MessageTooLarge {
                        size: read,
                        max_size: self.max_line_length,
                    });
                }
                return Err(WireProtocolError::UnexpectedEof {
                    operation: "line terminator".to_string(),
                });
            }

            let line = std::str::from_utf8(&self.buffer)?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                trace!("Skipping blank line");
                continue;
            }

            let message: Message = line.parse()?;
            debug!(command = %message.command, "Decoded message");
            return Ok(message);
        }
    }

    /// Skip the remainder of the current line, terminator included
    async fn discard_line(&mut self) -> Result<(), WireProtocolError> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.reader.consume(end + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                }
            }
        }
    }
}

/// Serializes messages as CRLF terminated lines
pub struct MessageWriter<W> {
    writer: W,
    max_line_length: usize,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W, config: &WireConfig) -> Self {
        Self {
            writer,
            max_line_length: config.max_line_length,
        }
    }

    /// Serialize, validate, write and flush one message
    #[instrument(level = "trace", skip(self, message), fields(command = %message.command))]
    pub async fn write_message(&mut self, message: &Message) -> Result<(), WireProtocolError> {
        let line = encode_line(message, self.max_line_length)?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        debug!(bytes = line.len(), "Encoded message");
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Shut down the underlying writer
    pub async fn shutdown(&mut self) -> Result<(), WireProtocolError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Render a message as a terminated line, enforcing the line limit.
///
/// Embedded CR or LF would split the message on the wire, so they are rejected.
pub fn encode_line(message: &Message, max_line_length: usize) -> Result<String, WireProtocolError> {
    if message.command.is_empty() {
        return Err(WireProtocolError::malformed("missing command"));
    }

    let body = message.to_string();
    if body.contains(['\r', '\n']) {
        return Err(WireProtocolError::malformed("line break inside message"));
    }

    let size = body.len() + LINE_TERMINATOR.len();
    if size > max_line_length {
        return Err(WireProtocolError::MessageTooLarge {
            size,
            max_size: max_line_length,
        });
    }

    let mut line = body;
    line.push_str(LINE_TERMINATOR);
    Ok(line)
}
