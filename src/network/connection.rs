use crate::messages::{Message, MessageReader, MessageWriter, WireConfig, WireProtocolError};
use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument};

/// A bidirectional, message-oriented transport.
///
/// `decode` and `encode` may be called concurrently from different tasks.
/// `close` must be idempotent: after the first call every outstanding and
/// future `decode`/`encode` fails with [`WireProtocolError::Closed`].
pub trait Connection: Send + Sync + 'static {
    /// Wait for the next complete inbound message
    fn decode(&self) -> impl Future<Output = Result<Message, WireProtocolError>> + Send;

    /// Serialize and transmit one message
    fn encode(&self, message: &Message) -> impl Future<Output = Result<(), WireProtocolError>> + Send;

    fn close(&self);
}

/// [`Connection`] over any split async byte stream.
///
/// The read and write sides are locked independently so a pending decode
/// never holds up an encode. Closing drops both halves as soon as no I/O is
/// using them, which shuts the transport down for the peer.
pub struct StreamConnection<R, W> {
    reader: Mutex<Option<MessageReader<R>>>,
    writer: Mutex<Option<MessageWriter<W>>>,
    closed: watch::Sender<bool>,
}

/// Connection over a TCP socket
pub type TcpConnection = StreamConnection<OwnedReadHalf, OwnedWriteHalf>;

impl<R, W> StreamConnection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W, config: &WireConfig) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(Some(MessageReader::new(reader, config))),
            writer: Mutex::new(Some(MessageWriter::new(writer, config))),
            closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once `close` has been called
    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Drop whichever halves are not locked by in-flight I/O. A half that is
    /// busy is dropped by its holder once the I/O has been cancelled.
    fn release(&self) {
        if let Ok(mut writer) = self.writer.try_lock() {
            if writer.take().is_some() {
                debug!("Write half released");
            }
        }
        if let Ok(mut reader) = self.reader.try_lock() {
            if reader.take().is_some() {
                debug!("Read half released");
            }
        }
    }

    async fn read(&self) -> Result<Message, WireProtocolError> {
        let mut guard = self.reader.lock().await;
        let Some(reader) = guard.as_mut() else {
            return Err(WireProtocolError::Closed);
        };
        tokio::select! {
            biased;
            _ = self.closed() => Err(WireProtocolError::Closed),
            result = reader.read_message() => result,
        }
    }

    async fn write(&self, message: &Message) -> Result<(), WireProtocolError> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(WireProtocolError::Closed);
        };
        tokio::select! {
            biased;
            _ = self.closed() => Err(WireProtocolError::Closed),
            result = writer.write_message(message) => result,
        }
    }
}

impl TcpConnection {
    /// Open a TCP connection, bounded by the configured connect timeout
    #[instrument(level = "debug", skip(config))]
    pub async fn connect(addr: &str, config: &WireConfig) -> Result<Self, WireProtocolError> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| WireProtocolError::ConnectTimeout {
                addr: addr.to_string(),
                timeout: config.connect_timeout,
            })??;
        stream.set_nodelay(true)?;

        info!(peer = %stream.peer_addr()?, "Connected");
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer, config))
    }
}

impl<R, W> Connection for StreamConnection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn decode(&self) -> Result<Message, WireProtocolError> {
        if self.is_closed() {
            return Err(WireProtocolError::Closed);
        }
        let result = self.read().await;
        // The lock is free again; finish a release that close() could not.
        if self.is_closed() {
            self.release();
        }
        result
    }

    async fn encode(&self, message: &Message) -> Result<(), WireProtocolError> {
        if self.is_closed() {
            return Err(WireProtocolError::Closed);
        }
        let result = self.write(message).await;
        if self.is_closed() {
            self.release();
        }
        result
    }

    fn close(&self) {
        let first = self.closed.send_if_modified(|closed| {
            let changed = !*closed;
            *closed = true;
            changed
        });
        if first {
            debug!("Connection closed");
        }
        self.release();
    }
}
