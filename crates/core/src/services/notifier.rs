//! Candidate change notifier.
//!
//! An explicit observer registry. Subscribers receive the full candidate
//! snapshot after every directory mutation through a bounded channel.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, trace};

use super::candidate::Candidate;

/// Event pushed to candidate feed subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CandidateEvent {
    /// The directory changed; `data` is the complete new list.
    CandidatesUpdated { data: Vec<Candidate> },
}

type Subscribers = Arc<RwLock<HashMap<u64, mpsc::Sender<CandidateEvent>>>>;

/// Registry of candidate feed subscribers.
#[derive(Clone)]
pub struct CandidateNotifier {
    subscribers: Subscribers,
    next_id: Arc<AtomicU64>,
    buffer: usize,
}

impl CandidateNotifier {
    /// Create a notifier whose subscribers buffer up to `buffer` events.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber.
    pub async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.write().await.insert(id, tx);
        debug!(subscriber = id, "Candidate feed subscriber added");

        Subscription {
            id,
            rx,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub async fn unsubscribe(&self, id: u64) -> bool {
        let removed = self.subscribers.write().await.remove(&id).is_some();
        if removed {
            debug!(subscriber = id, "Candidate feed subscriber removed");
        }
        removed
    }

    /// Deliver an event to every subscriber.
    ///
    /// Subscribers whose receiver is gone or whose buffer is full are dropped.
    /// Returns the number of subscribers that received the event.
    pub async fn notify(&self, event: CandidateEvent) -> usize {
        let mut stale = Vec::new();
        let mut delivered = 0;

        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                match tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(subscriber = id, "Candidate feed subscriber lagging, dropping");
                        stale.push(*id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(*id),
                }
            }
        }

        if !stale.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &stale {
                subscribers.remove(id);
            }
        }

        trace!(delivered, pruned = stale.len(), "Candidate event delivered");
        delivered
    }

    /// Remove every subscriber. Their subscriptions end once drained.
    ///
    /// Returns the number of subscribers removed.
    pub async fn close_all(&self) -> usize {
        let mut subscribers = self.subscribers.write().await;
        let closed = subscribers.len();
        subscribers.clear();
        debug!(closed, "Candidate feed subscribers closed");
        closed
    }

    /// Number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

/// Receiving end of a subscription. Unregisters itself when dropped.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<CandidateEvent>,
    subscribers: Subscribers,
}

impl Subscription {
    /// Subscriber id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. `None` once the subscriber was removed.
    pub async fn recv(&mut self) -> Option<CandidateEvent> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = CandidateEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();

        // Fast path; otherwise defer to the runtime. A closed sender is also
        // pruned on the next notify.
        if let Ok(mut subscribers) = self.subscribers.try_write() {
            subscribers.remove(&self.id);
        } else if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let subscribers = Arc::clone(&self.subscribers);
            let id = self.id;
            handle.spawn(async move {
                subscribers.write().await.remove(&id);
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn event(count: usize) -> CandidateEvent {
        let data = (1..=count)
            .map(|i| Candidate {
                id: i.to_string(),
                name: format!("Candidate {i}"),
                image: String::new(),
                party: "Independent".to_string(),
                description: "Test".to_string(),
            })
            .collect();
        CandidateEvent::CandidatesUpdated { data }
    }

    #[tokio::test]
    async fn test_notify_reaches_every_subscriber() {
        let notifier = CandidateNotifier::new(4);
        let mut a = notifier.subscribe().await;
        let mut b = notifier.subscribe().await;

        assert_eq!(notifier.notify(event(2)).await, 2);
        assert_eq!(a.recv().await.unwrap(), event(2));
        assert_eq!(b.next().await.unwrap(), event(2));
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let notifier = CandidateNotifier::new(4);
        let sub = notifier.subscribe().await;

        assert!(notifier.unsubscribe(sub.id()).await);
        assert!(!notifier.unsubscribe(sub.id()).await);
        assert_eq!(notifier.notify(event(1)).await, 0);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_removed() {
        let notifier = CandidateNotifier::new(4);
        let sub = notifier.subscribe().await;
        assert_eq!(notifier.subscriber_count().await, 1);

        drop(sub);
        tokio::task::yield_now().await;

        notifier.notify(event(1)).await;
        assert_eq!(notifier.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_pruned() {
        let notifier = CandidateNotifier::new(1);
        let mut slow = notifier.subscribe().await;

        assert_eq!(notifier.notify(event(1)).await, 1);
        assert_eq!(notifier.notify(event(2)).await, 0);
        assert_eq!(notifier.subscriber_count().await, 0);

        // The buffered event is still readable, then the stream ends.
        assert_eq!(slow.recv().await.unwrap(), event(1));
        assert!(slow.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_all_ends_subscriptions() {
        let notifier = CandidateNotifier::new(4);
        let mut a = notifier.subscribe().await;
        let mut b = notifier.subscribe().await;
        notifier.notify(event(1)).await;

        assert_eq!(notifier.close_all().await, 2);
        assert_eq!(notifier.subscriber_count().await, 0);

        assert_eq!(a.recv().await.unwrap(), event(1));
        assert!(a.recv().await.is_none());
        assert_eq!(b.next().await.unwrap(), event(1));
        assert!(b.next().await.is_none());
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(event(1)).unwrap();
        assert_eq!(json["type"], "candidates-updated");
        assert_eq!(json["data"][0]["id"], "1");
        assert_eq!(json["data"][0]["party"], "Independent");
    }
}
