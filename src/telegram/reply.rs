use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("Cancelled by new request")]
    Displaced,

    #[error("Response timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Reply waiter closed")]
    Closed,
}

type Slot = oneshot::Sender<Result<String, ReplyError>>;

/// At most one outstanding reply wait per conversation key. Registering a new
/// wait fails the previous one with [`ReplyError::Displaced`].
#[derive(Default)]
pub struct ReplyWaiter {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ReplyWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register before sending the question so a fast reply is not lost.
    pub fn register(&self, key: impl Into<String>) -> PendingReply {
        let (tx, rx) = oneshot::channel();
        let previous = self.lock().insert(key.into(), tx);
        if let Some(previous) = previous {
            let _ = previous.send(Err(ReplyError::Displaced));
        }
        PendingReply { rx }
    }

    /// Hands `text` to the waiter for `key`. Returns false when nobody is
    /// waiting (or the waiter already gave up).
    pub fn offer(&self, key: &str, text: impl Into<String>) -> bool {
        match self.lock().remove(key) {
            Some(slot) => slot.send(Ok(text.into())).is_ok(),
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_waiting(&self, key: &str) -> bool {
        self.lock()
            .get(key)
            .map(|slot| !slot.is_closed())
            .unwrap_or(false)
    }

    /// Fails every outstanding wait with [`ReplyError::Closed`].
    pub fn close(&self) {
        for (_, slot) in self.lock().drain() {
            let _ = slot.send(Err(ReplyError::Closed));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct PendingReply {
    rx: oneshot::Receiver<Result<String, ReplyError>>,
}

impl PendingReply {
    /// Races the reply against the deadline.
    pub async fn wait(self, timeout: Duration) -> Result<String, ReplyError> {
        tokio::select! {
            reply = self.rx => reply.unwrap_or(Err(ReplyError::Closed)),
            _ = tokio::time::sleep(timeout) => Err(ReplyError::Timeout(timeout)),
        }
    }
}
