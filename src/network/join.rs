use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Counts running loops; [`JoinCounter::wait`] resolves when it reaches zero.
#[derive(Debug, Clone)]
pub(crate) struct JoinCounter {
    running: Arc<watch::Sender<usize>>,
}

/// Held by a running loop; decrements the counter when dropped, including
/// on panic.
#[derive(Debug)]
pub(crate) struct LoopGuard {
    running: Arc<watch::Sender<usize>>,
    name: &'static str,
}

impl JoinCounter {
    pub(crate) fn new() -> Self {
        let (running, _) = watch::channel(0);
        Self {
            running: Arc::new(running),
        }
    }

    /// Register one more loop
    pub(crate) fn guard(&self, name: &'static str) -> LoopGuard {
        self.running.send_modify(|running| *running += 1);
        LoopGuard {
            running: Arc::clone(&self.running),
            name,
        }
    }

    pub(crate) fn running(&self) -> usize {
        *self.running.borrow()
    }

    pub(crate) async fn wait(&self) {
        let mut rx = self.running.subscribe();
        let _ = rx.wait_for(|running| *running == 0).await;
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.running.send_modify(|running| *running -= 1);
        debug!(task = self.name, "Loop exited");
    }
}
