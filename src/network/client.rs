use crate::messages::Message;
use crate::network::config::ClientConfig;
use crate::network::connection::Connection;
use crate::network::errors::{ClientError, Result};
use crate::network::handler::{Handler, Sender};
use crate::network::join::{JoinCounter, LoopGuard};
use crate::network::shutdown::Shutdown;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

/// State shared by the client handle and its three loops
struct Inner<C> {
    connection: C,
    queue: mpsc::Sender<Message>,
    shutdown: Shutdown,
    loops: JoinCounter,
    config: ClientConfig,
}

impl<C: Connection> Inner<C> {
    /// Close the connection first so a blocked decode/encode wakes up, then
    /// close the shutdown signal.
    fn disconnect(&self) {
        self.connection.close();
        if self.shutdown.trigger() {
            info!("Client shutting down");
        }
    }

    fn sender(&self) -> Sender {
        Sender::new(self.queue.clone())
    }
}

/// Client runtime over a single persistent connection.
///
/// Owns three loops: input (decode and dispatch to the handler), output
/// (drain the outbound queue with flood control) and ping (keepalive).
/// A client is single use; once shut down it cannot be restarted.
///
/// Dropping every `Client` handle does not stop the loops; call
/// [`Client::disconnect`].
pub struct Client<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Client<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`Client`]; refuses to produce a client without both a
/// connection and a handler.
pub struct ClientBuilder<C, H> {
    connection: Option<C>,
    handler: Option<H>,
    config: ClientConfig,
}

impl<C, H> Default for ClientBuilder<C, H> {
    fn default() -> Self {
        Self {
            connection: None,
            handler: None,
            config: ClientConfig::default(),
        }
    }
}

impl<C, H> ClientBuilder<C, H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(mut self, connection: C) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }
}

impl<C: Connection, H: Handler> ClientBuilder<C, H> {
    /// Validate and start the client. Nothing is spawned on error.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Client<C>> {
        let connection = self.connection.ok_or(ClientError::MissingConnection)?;
        let handler = self.handler.ok_or(ClientError::MissingHandler)?;
        self.config.validate()?;
        Ok(Client::spawn(connection, handler, self.config))
    }
}

impl<C: Connection> Client<C> {
    /// Start a client with the default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<H: Handler>(connection: C, handler: H) -> Self {
        Self::spawn(connection, handler, ClientConfig::default())
    }

    pub fn builder<H: Handler>() -> ClientBuilder<C, H> {
        ClientBuilder::new()
    }

    fn spawn<H: Handler>(connection: C, handler: H, config: ClientConfig) -> Self {
        let (queue, outbound) = mpsc::channel(config.queue_capacity);
        let inner = Arc::new(Inner {
            connection,
            queue,
            shutdown: Shutdown::new(),
            loops: JoinCounter::new(),
            config,
        });

        // Guards are registered before any loop runs so `wait` can never
        // observe a partially started client.
        let input = inner.loops.guard("input");
        let output = inner.loops.guard("output");
        let ping = inner.loops.guard("ping");

        tokio::spawn(input_loop(Arc::clone(&inner), Arc::new(handler), input));
        tokio::spawn(output_loop(Arc::clone(&inner), outbound, output));
        tokio::spawn(ping_loop(Arc::clone(&inner), ping));

        info!(
            queue_capacity = inner.config.queue_capacity,
            flood_interval = ?inner.config.flood_interval,
            ping_interval = ?inner.config.ping_interval,
            "Client started"
        );
        Self { inner }
    }

    /// Send both USER and NICK; on servers without a password this should be
    /// the first thing a client does.
    pub async fn identify(
        &self,
        nickname: impl Into<String>,
        username: impl Into<String>,
        realname: impl Into<String>,
    ) -> Result<()> {
        self.send(Message::user(username, realname)).await?;
        self.send(Message::nick(nickname)).await
    }

    /// Queue a message for transmission, waiting while the queue is full.
    ///
    /// Transport failures are never reported here. Once the output loop has
    /// exited this fails with [`ClientError::Closed`] instead of blocking.
    pub async fn send(&self, message: Message) -> Result<()> {
        self.inner
            .queue
            .send(message)
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// A cloneable handle for enqueueing messages
    pub fn sender(&self) -> Sender {
        self.inner.sender()
    }

    /// Close the connection and signal every loop to stop. Safe to call any
    /// number of times, from any task.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Wait until all three loops have exited. Does not trigger shutdown.
    pub async fn wait(&self) {
        self.inner.loops.wait().await;
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_triggered()
    }

    /// Number of loops still running
    pub fn running_loops(&self) -> usize {
        self.inner.loops.running()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

/// Log a transport failure unless it is the expected fallout of shutdown
fn report_transport_error<C: Connection>(
    inner: &Inner<C>,
    operation: &str,
    error: &crate::messages::WireProtocolError,
) {
    if inner.shutdown.is_triggered() {
        debug!(operation, error = %error, "Transport stopped during shutdown");
    } else {
        warn!(operation, error = %error, "Transport failed, disconnecting");
    }
}

#[instrument(name = "input", skip_all)]
async fn input_loop<C: Connection, H: Handler>(
    inner: Arc<Inner<C>>,
    handler: Arc<H>,
    _guard: LoopGuard,
) {
    // Shutdown is only observed between decodes; a pending decode is
    // released by the connection being closed.
    while !inner.shutdown.is_triggered() {
        match inner.connection.decode().await {
            Ok(message) => {
                trace!(%message, "Dispatching to handler");
                let handler = Arc::clone(&handler);
                let sender = inner.sender();
                // Detached: a panicking handler only takes down its own task.
                tokio::spawn(async move {
                    handler.handle(message, sender).await;
                });
            }
            Err(e) if e.is_message_level() => {
                warn!(error = %e, "Skipping unreadable inbound line");
            }
            Err(e) => {
                report_transport_error(&inner, "decode", &e);
                inner.disconnect();
                break;
            }
        }
    }
}

#[instrument(name = "output", skip_all)]
async fn output_loop<C: Connection>(
    inner: Arc<Inner<C>>,
    mut outbound: mpsc::Receiver<Message>,
    _guard: LoopGuard,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = inner.shutdown.wait() => break,
            message = outbound.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        match inner.connection.encode(&message).await {
            Ok(()) => {}
            Err(e) if e.is_message_level() => {
                // Nothing reached the wire, so no flood delay is owed.
                warn!(command = %message.command, error = %e, "Dropping unsendable message");
                continue;
            }
            Err(e) => {
                report_transport_error(&inner, "encode", &e);
                inner.disconnect();
                break;
            }
        }
        trace!(command = %message.command, "Message sent");

        // Flood control
        tokio::select! {
            biased;
            _ = inner.shutdown.wait() => break,
            _ = time::sleep(inner.config.flood_interval) => {}
        }
    }

    // Wake any producer blocked on a full queue.
    outbound.close();
}

#[instrument(name = "ping", skip_all)]
async fn ping_loop<C: Connection>(inner: Arc<Inner<C>>, _guard: LoopGuard) {
    let period = inner.config.ping_interval;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = inner.shutdown.wait() => break,
            _ = ticker.tick() => {}
        }
        if inner.shutdown.is_triggered() {
            break;
        }

        let ping = Message::ping(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true));
        debug!(token = ?ping.trailing, "Queueing keepalive");
        let queued = tokio::select! {
            biased;
            _ = inner.shutdown.wait() => break,
            result = inner.queue.send(ping) => result,
        };
        if queued.is_err() {
            break;
        }
    }
}
