//! Helpers for observing handler invocations

use std::future::Future;
use std::time::Duration;
use tether::{Message, Sender};
use tokio::sync::mpsc;

/// Upper bound for anything that should happen "promptly" in real time
pub const PROMPTLY: Duration = Duration::from_secs(2);

/// Handler that forwards every inbound message to the returned receiver
pub fn recording_handler() -> (
    impl Fn(Message, Sender) -> std::future::Ready<()> + Send + Sync + 'static,
    mpsc::UnboundedReceiver<Message>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |message: Message, _sender: Sender| {
        let _ = tx.send(message);
        std::future::ready(())
    };
    (handler, rx)
}

/// Handler that ignores everything
pub fn noop_handler(_message: Message, _sender: Sender) -> std::future::Ready<()> {
    std::future::ready(())
}

/// Await `future`, failing the test if it takes longer than [`PROMPTLY`]
pub async fn promptly<F: Future>(future: F, what: &str) -> F::Output {
    tokio::time::timeout(PROMPTLY, future)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
}

/// Build a numbered PRIVMSG for ordering checks
pub fn numbered(producer: usize, seq: usize) -> Message {
    Message::new("PRIVMSG")
        .with_params(["#test"])
        .with_trailing(format!("{}:{}", producer, seq))
}

/// Inverse of [`numbered`]
pub fn parse_numbered(message: &Message) -> Option<(usize, usize)> {
    let (producer, seq) = message.trailing.as_deref()?.split_once(':')?;
    Some((producer.parse().ok()?, seq.parse().ok()?))
}
