//! Removal Notification Module
//!
//! Broadcasts "entry left the store" events to registered observers and to
//! channel subscribers. Delivery is best-effort: a failing observer is
//! logged and skipped.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use crate::cache::EntryKey;

/// Capacity of the subscriber channel; slower receivers observe a lag.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// == Removal Reason ==
/// Why an entry left the store without a caller asking for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The entry outlived its expiration
    Expired,
    /// The store dropped the entry to make room
    Evicted,
    /// Something outside the handle deleted the entry
    ExternalDelete,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemovalReason::Expired => "expired",
            RemovalReason::Evicted => "evicted",
            RemovalReason::ExternalDelete => "external_delete",
        };
        f.write_str(name)
    }
}

// == Removal Event ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalEvent {
    pub key: String,
    pub region: Option<String>,
    pub reason: RemovalReason,
}

impl RemovalEvent {
    pub fn new(key: EntryKey, reason: RemovalReason) -> Self {
        Self {
            key: key.key,
            region: key.region,
            reason,
        }
    }
}

/// Observer callback. An `Err` is logged and does not stop delivery.
pub type RemovalHandler = dyn Fn(&RemovalEvent) -> anyhow::Result<()> + Send + Sync;

// == Removal Notifier ==
/// Observer list plus broadcast channel.
pub struct RemovalNotifier {
    observers: RwLock<Vec<Arc<RemovalHandler>>>,
    sender: broadcast::Sender<RemovalEvent>,
}

impl RemovalNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            observers: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Registers an observer for every later event.
    pub fn register<F>(&self, handler: F)
    where
        F: Fn(&RemovalEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.observers.write().push(Arc::new(handler));
    }

    /// Opens a channel receiving every later event.
    pub fn subscribe(&self) -> broadcast::Receiver<RemovalEvent> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    // == Dispatch ==
    /// Delivers `event` to every observer, then to channel subscribers.
    ///
    /// Observers run outside the list lock so a handler may register
    /// further observers.
    pub fn dispatch(&self, event: RemovalEvent) {
        let observers: Vec<Arc<RemovalHandler>> = self.observers.read().clone();

        for observer in observers {
            match catch_unwind(AssertUnwindSafe(|| observer(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!("Removal observer failed for '{}': {:#}", event.key, err);
                }
                Err(_) => {
                    warn!("Removal observer panicked for '{}'", event.key);
                }
            }
        }

        // No subscribers is not a failure
        let _ = self.sender.send(event);
    }
}

impl Default for RemovalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RemovalNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalNotifier")
            .field("observers", &self.observer_count())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn expired(key: &str) -> RemovalEvent {
        RemovalEvent::new(EntryKey::new(key), RemovalReason::Expired)
    }

    #[test]
    fn test_event_from_key() {
        let event = RemovalEvent::new(EntryKey::in_region("k", "r"), RemovalReason::Evicted);
        assert_eq!(event.key, "k");
        assert_eq!(event.region.as_deref(), Some("r"));
        assert_eq!(event.reason.to_string(), "evicted");
    }

    #[test]
    fn test_dispatch_reaches_every_observer() {
        let notifier = RemovalNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let seen = seen.clone();
            notifier.register(move |event: &RemovalEvent| {
                seen.lock().push((id, event.key.clone()));
                Ok(())
            });
        }

        notifier.dispatch(expired("a"));

        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![(0, "a".to_string()), (1, "a".to_string()), (2, "a".to_string())]
        );
    }

    #[test]
    fn test_failing_observers_are_isolated() {
        let notifier = RemovalNotifier::new();
        let delivered = Arc::new(Mutex::new(0));

        notifier.register(|_: &RemovalEvent| Err(anyhow::anyhow!("observer down")));
        notifier.register(|_: &RemovalEvent| -> anyhow::Result<()> { panic!("observer bug") });
        {
            let delivered = delivered.clone();
            notifier.register(move |_: &RemovalEvent| {
                *delivered.lock() += 1;
                Ok(())
            });
        }

        notifier.dispatch(expired("a"));
        notifier.dispatch(expired("b"));

        assert_eq!(*delivered.lock(), 2);
        assert_eq!(notifier.observer_count(), 3);
    }

    #[test]
    fn test_observer_may_register_during_dispatch() {
        let notifier = Arc::new(RemovalNotifier::new());
        {
            let inner = notifier.clone();
            notifier.register(move |_: &RemovalEvent| {
                inner.register(|_: &RemovalEvent| Ok(()));
                Ok(())
            });
        }

        notifier.dispatch(expired("a"));
        assert_eq!(notifier.observer_count(), 2);
    }

    #[test]
    fn test_subscribers_receive_events() {
        let notifier = RemovalNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.dispatch(expired("a"));

        assert_eq!(rx.try_recv().unwrap(), expired("a"));
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let notifier = RemovalNotifier::new();
        notifier.dispatch(expired("a"));
    }
}
