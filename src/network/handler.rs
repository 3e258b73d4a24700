use crate::messages::Message;
use crate::network::errors::{ClientError, Result};
use std::future::Future;
use tokio::sync::mpsc;

/// Capability to enqueue outbound messages on a client.
///
/// Cheap to clone; handed to every handler invocation so replies go through
/// the same flood-controlled queue as everything else.
#[derive(Debug, Clone)]
pub struct Sender {
    queue: mpsc::Sender<Message>,
}

impl Sender {
    pub(crate) fn new(queue: mpsc::Sender<Message>) -> Self {
        Self { queue }
    }

    /// Enqueue a message, waiting while the queue is full.
    ///
    /// Fails only once the client's output loop has exited.
    pub async fn send(&self, message: Message) -> Result<()> {
        self.queue
            .send(message)
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// `true` once nothing drains the queue anymore
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

/// Logic invoked once per inbound message.
///
/// Each invocation runs in its own task. Invocations start in the order
/// messages were decoded but may overlap and finish in any order.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, message: Message, sender: Sender) -> impl Future<Output = ()> + Send;
}

impl<F, Fut> Handler for F
where
    F: Fn(Message, Sender) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, message: Message, sender: Sender) -> impl Future<Output = ()> + Send {
        self(message, sender)
    }
}
