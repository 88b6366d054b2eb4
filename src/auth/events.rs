// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth state change notifications.
//!
//! Listeners hold a [`Subscription`]; dropping it unsubscribes. Publishing
//! never blocks and never fails when nobody is listening.

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn { user_id: String, session_id: String },
    SignedOut { user_id: String, session_id: String },
    UserUpdated { user_id: String },
}

impl AuthEvent {
    pub fn user_id(&self) -> &str {
        match self {
            AuthEvent::SignedIn { user_id, .. }
            | AuthEvent::SignedOut { user_id, .. }
            | AuthEvent::UserUpdated { user_id } => user_id,
        }
    }
}

/// Fan-out channel for [`AuthEvent`]s.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver `event` to current subscribers. Returns how many received it.
    pub fn publish(&self, event: AuthEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// A live subscription to auth events.
pub struct Subscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl Subscription {
    /// Next event, or `None` once every publisher is gone.
    ///
    /// A subscriber that falls behind skips the missed events.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-queued event, if any.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updated(user_id: &str) -> AuthEvent {
        AuthEvent::UserUpdated {
            user_id: user_id.to_string(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let events = AuthEvents::default();
        let mut sub = events.subscribe();

        events.publish(AuthEvent::SignedIn {
            user_id: "A".to_string(),
            session_id: "s1".to_string(),
        });
        events.publish(updated("A"));

        assert!(matches!(sub.recv().await, Some(AuthEvent::SignedIn { .. })));
        assert_eq!(sub.recv().await, Some(updated("A")));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let events = AuthEvents::default();
        let sub = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);
        assert_eq!(events.publish(updated("A")), 1);

        drop(sub);
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(events.publish(updated("A")), 0);
    }

    #[test]
    fn lagging_subscriber_keeps_newest_events() {
        let events = AuthEvents::new(2);
        let mut sub = events.subscribe();
        for user in ["A", "B", "C"] {
            events.publish(updated(user));
        }

        assert_eq!(sub.try_recv(), Some(updated("B")));
        assert_eq!(sub.try_recv(), Some(updated("C")));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn events_serialise_with_tag() {
        let json = serde_json::to_value(updated("A")).unwrap();
        assert_eq!(json["event"], "user_updated");
        assert_eq!(json["user_id"], "A");
    }
}
