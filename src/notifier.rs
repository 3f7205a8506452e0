//!
//! # Change Notifier
//!
//! In-process publish/subscribe fan-out of task mutations. Each connected
//! session subscribes to one or more scopes (a project id or a user id) and
//! receives every event published to those scopes while it is subscribed.
//!
//! Delivery contract:
//! - exactly once per currently subscribed session, best-effort: no
//!   persistence, no replay, no acknowledgement. A disconnected session
//!   simply misses the event.
//! - per-scope FIFO: events published to one scope reach each subscriber in
//!   publish order. No ordering guarantee holds across scopes.
//! - publishing never fails the triggering mutation; a closed receiver is
//!   pruned and logged.
//!
//! The notifier is an explicitly constructed service handed to handlers via
//! `web::Data`, not a process-wide singleton. The subscription table is the
//! only cross-request shared mutable state in the process; its mutex is held
//! only for the O(subscribers) fan-out over non-blocking channels, never
//! across network I/O.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// A grouping key used to target event delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Project(Uuid),
    User(i32),
}

/// Event kinds emitted on the real-time channel. Serialized in camelCase to
/// match the wire contract (`taskCreated`, `commentAdded`, ...).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskAssigned,
    CommentAdded,
}

impl EventKind {
    /// Wire name used as the SSE event field.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskCreated => "taskCreated",
            EventKind::TaskUpdated => "taskUpdated",
            EventKind::TaskDeleted => "taskDeleted",
            EventKind::TaskAssigned => "taskAssigned",
            EventKind::CommentAdded => "commentAdded",
        }
    }
}

/// A single published event: its kind and the affected entity as JSON.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

struct Subscriber {
    id: Uuid,
    tx: UnboundedSender<ChangeEvent>,
}

/// The subscriber registry. Created once at process start and torn down at
/// shutdown.
#[derive(Default)]
pub struct ChangeNotifier {
    registry: Mutex<HashMap<Scope, Vec<Subscriber>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscription on `scope` and returns its id together
    /// with the receiving end of the event channel. A session may hold any
    /// number of subscriptions across scopes.
    pub fn subscribe(&self, scope: Scope) -> (Uuid, UnboundedReceiver<ChangeEvent>) {
        let (tx, rx) = unbounded_channel();
        let id = Uuid::new_v4();
        let mut registry = self.registry.lock().unwrap();
        registry
            .entry(scope)
            .or_default()
            .push(Subscriber { id, tx });
        (id, rx)
    }

    /// Removes one subscription. Dropping the receiver alone also works: the
    /// dead sender is pruned on the next publish to the scope.
    pub fn unsubscribe(&self, scope: Scope, id: Uuid) {
        let mut registry = self.registry.lock().unwrap();
        if let Some(subs) = registry.get_mut(&scope) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                registry.remove(&scope);
            }
        }
    }

    /// Delivers `event` to every session currently subscribed to `scope`,
    /// exactly once each. Sends are non-blocking; subscribers whose receiver
    /// has gone away are dropped from the registry.
    pub fn publish(&self, scope: Scope, event: ChangeEvent) {
        let mut registry = self.registry.lock().unwrap();
        if let Some(subs) = registry.get_mut(&scope) {
            subs.retain(|s| {
                if s.tx.send(event.clone()).is_err() {
                    log::warn!("dropping dead subscriber {} on {:?}", s.id, scope);
                    false
                } else {
                    true
                }
            });
            if subs.is_empty() {
                registry.remove(&scope);
            }
        }
    }

    /// Number of live subscriptions on a scope. Used by tests and diagnostics.
    pub fn subscriber_count(&self, scope: Scope) -> usize {
        self.registry
            .lock()
            .unwrap()
            .get(&scope)
            .map_or(0, |s| s.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: EventKind, n: i32) -> ChangeEvent {
        ChangeEvent {
            kind,
            payload: json!({ "n": n }),
        }
    }

    #[tokio::test]
    async fn test_fanout_delivers_exactly_once_per_subscriber() {
        let notifier = ChangeNotifier::new();
        let scope = Scope::Project(Uuid::new_v4());

        let (_id_a, mut rx_a) = notifier.subscribe(scope);
        let (_id_b, mut rx_b) = notifier.subscribe(scope);
        let (_id_c, mut rx_c) = notifier.subscribe(Scope::User(7));

        notifier.publish(scope, event(EventKind::TaskCreated, 1));

        assert_eq!(rx_a.recv().await.unwrap().kind, EventKind::TaskCreated);
        assert_eq!(rx_b.recv().await.unwrap().kind, EventKind::TaskCreated);
        // Exactly once: nothing further queued
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
        // A session subscribed to a different scope receives nothing
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_per_scope_fifo_order() {
        let notifier = ChangeNotifier::new();
        let scope = Scope::User(1);
        let (_id, mut rx) = notifier.subscribe(scope);

        for n in 0..10 {
            notifier.publish(scope, event(EventKind::TaskUpdated, n));
        }
        for n in 0..10 {
            let got = rx.recv().await.unwrap();
            assert_eq!(got.payload["n"], n);
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned_on_publish() {
        let notifier = ChangeNotifier::new();
        let scope = Scope::Project(Uuid::new_v4());

        let (_id_a, rx_a) = notifier.subscribe(scope);
        let (_id_b, mut rx_b) = notifier.subscribe(scope);
        assert_eq!(notifier.subscriber_count(scope), 2);

        drop(rx_a);
        notifier.publish(scope, event(EventKind::TaskDeleted, 1));

        assert_eq!(notifier.subscriber_count(scope), 1);
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_single_subscription() {
        let notifier = ChangeNotifier::new();
        let scope = Scope::User(2);

        let (id_a, mut rx_a) = notifier.subscribe(scope);
        let (_id_b, mut rx_b) = notifier.subscribe(scope);

        notifier.unsubscribe(scope, id_a);
        notifier.publish(scope, event(EventKind::CommentAdded, 1));

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.recv().await.unwrap().kind, EventKind::CommentAdded);
    }

    #[test]
    fn test_publish_to_empty_scope_is_a_noop() {
        let notifier = ChangeNotifier::new();
        notifier.publish(Scope::User(42), event(EventKind::TaskCreated, 1));
        assert_eq!(notifier.subscriber_count(Scope::User(42)), 0);
    }

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventKind::TaskCreated).unwrap(),
            "\"taskCreated\""
        );
        assert_eq!(
            serde_json::to_string(&EventKind::CommentAdded).unwrap(),
            "\"commentAdded\""
        );
        assert_eq!(EventKind::TaskAssigned.as_str(), "taskAssigned");
    }
}
