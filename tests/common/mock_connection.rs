//! Scripted connection for driving the client loops without a socket
//!
//! Inbound results are pushed by the test; every successful encode is
//! recorded together with the (tokio) instant it happened so pacing can be
//! asserted under paused time.

use std::io::{Error as IoError, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tether::{Connection, Message, WireProtocolError};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex, Notify};
use tokio::time::Instant;

type Inbound = Result<Message, WireProtocolError>;

#[derive(Clone)]
pub struct MockConnection {
    state: Arc<MockState>,
}

struct MockState {
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: AsyncMutex<mpsc::UnboundedReceiver<Inbound>>,
    encoded: Mutex<Vec<(Instant, Message)>>,
    encoded_changed: Notify,
    /// Encode attempts that succeed before every further encode fails
    encode_budget: Option<usize>,
    encode_attempts: AtomicUsize,
    closed: watch::Sender<bool>,
    decode_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A connection whose encodes start failing after `successes` messages
    pub fn failing_encode_after(successes: usize) -> Self {
        Self::build(Some(successes))
    }

    fn build(encode_budget: Option<usize>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        Self {
            state: Arc::new(MockState {
                inbound_tx,
                inbound_rx: AsyncMutex::new(inbound_rx),
                encoded: Mutex::new(Vec::new()),
                encoded_changed: Notify::new(),
                encode_budget,
                encode_attempts: AtomicUsize::new(0),
                closed,
                decode_calls: AtomicUsize::new(0),
                close_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Make `message` the next decode result
    pub fn push_inbound(&self, message: Message) {
        let _ = self.state.inbound_tx.send(Ok(message));
    }

    /// Make the next decode fail
    pub fn push_error(&self, error: WireProtocolError) {
        let _ = self.state.inbound_tx.send(Err(error));
    }

    pub fn encoded(&self) -> Vec<Message> {
        self.encoded_at().into_iter().map(|(_, m)| m).collect()
    }

    pub fn encoded_at(&self) -> Vec<(Instant, Message)> {
        self.state.encoded.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages have been encoded
    pub async fn wait_for_encoded(&self, count: usize) -> Vec<(Instant, Message)> {
        loop {
            let changed = self.state.encoded_changed.notified();
            let encoded = self.encoded_at();
            if encoded.len() >= count {
                return encoded;
            }
            changed.await;
        }
    }

    pub fn decode_calls(&self) -> usize {
        self.state.decode_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        *self.state.closed.borrow()
    }

    async fn closed(&self) {
        let mut rx = self.state.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Connection for MockConnection {
    async fn decode(&self) -> Result<Message, WireProtocolError> {
        self.state.decode_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(WireProtocolError::Closed);
        }
        let mut inbound = self.state.inbound_rx.lock().await;
        tokio::select! {
            biased;
            _ = self.closed() => Err(WireProtocolError::Closed),
            next = inbound.recv() => next.unwrap_or(Err(WireProtocolError::Closed)),
        }
    }

    async fn encode(&self, message: &Message) -> Result<(), WireProtocolError> {
        if self.is_closed() {
            return Err(WireProtocolError::Closed);
        }
        let attempt = self.state.encode_attempts.fetch_add(1, Ordering::SeqCst);
        if matches!(self.state.encode_budget, Some(budget) if attempt >= budget) {
            return Err(WireProtocolError::Io(IoError::new(
                ErrorKind::BrokenPipe,
                "scripted encode failure",
            )));
        }
        self.state
            .encoded
            .lock()
            .unwrap()
            .push((Instant::now(), message.clone()));
        self.state.encoded_changed.notify_waiters();
        Ok(())
    }

    fn close(&self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.send_replace(true);
    }
}
