use std::sync::Arc;
use tokio::sync::watch;

/// Single-fire broadcast quit signal.
///
/// Starts open and moves to closed at most once, no matter how many callers
/// race on [`Shutdown::trigger`]. Every clone observes the same state.
#[derive(Debug, Clone)]
pub struct Shutdown {
    state: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Close the signal. Returns `true` only for the call that performed the
    /// transition.
    pub fn trigger(&self) -> bool {
        // The check and the store happen under the channel's lock.
        self.state.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    pub fn is_triggered(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the signal is closed; immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
