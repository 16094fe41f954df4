//   Copyright (c) 2024-2026 The Vessel Authors
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Per-subscriber filtering and delivery (§4.6, §4.7).
//!
//! A subscriber does not see notifications caused by its own session
//! unless it marked its subscription exclusive — the supplemental
//! behaviour carried over from the resource-agent self-notification
//! suppression the distillation dropped. `want_debug_notifications`
//! additionally wraps every delivered notification in a
//! `NotificationType::Debug` copy so a debugging client can see the
//! raw feed regardless of its own filters.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::model::Id;

use super::types::{Notification, NotificationType};

/// What a single subscription is interested in. All filters are
/// additive (a notification matching any one of them is delivered);
/// `all_monitored` overrides them all.
#[derive(Debug, Clone, Default)]
pub struct SubscriberInterest {
    pub session: String,
    pub monitored_collections: HashSet<Id>,
    pub monitored_items: HashSet<Id>,
    pub monitored_resources: HashSet<String>,
    pub monitored_mime_types: HashSet<String>,
    pub ignored_sessions: HashSet<String>,
    pub all_monitored: bool,
    pub exclusive: bool,
    pub want_debug_notifications: bool,
}

impl SubscriberInterest {
    fn matches_filters(&self, n: &Notification) -> bool {
        if self.all_monitored {
            return true;
        }
        if n.items.iter().any(|e| self.monitored_items.contains(&e.id)) {
            return true;
        }
        if let Some(parent) = n.parent {
            if self.monitored_collections.contains(&parent) {
                return true;
            }
        }
        if n.kind == NotificationType::Collection
            && n.items.iter().any(|e| self.monitored_collections.contains(&e.id))
        {
            return true;
        }
        if let Some(resource) = &n.resource {
            if self.monitored_resources.contains(resource) {
                return true;
            }
        }
        if n.items
            .iter()
            .any(|e| e.mime_type.as_deref().is_some_and(|m| self.monitored_mime_types.contains(m)))
        {
            return true;
        }
        false
    }

    fn wants(&self, n: &Notification) -> bool {
        if self.ignored_sessions.contains(&n.session) {
            return false;
        }
        if n.session == self.session && !self.exclusive {
            return false;
        }
        self.matches_filters(n)
    }
}

struct Subscriber {
    interest: SubscriberInterest,
    outbox: mpsc::Sender<Notification>,
}

/// Holds one entry per active subscription and fans committed
/// notifications out to the ones whose interest matches. Delivery is
/// best-effort: a full or closed outbox drops the notification for
/// that subscriber rather than blocking the committing transaction.
#[derive(Default)]
pub struct FanoutHub {
    subscribers: DashMap<String, Subscriber>,
}

impl FanoutHub {
    pub fn new() -> Self {
        FanoutHub::default()
    }

    pub fn subscribe(&self, name: impl Into<String>, interest: SubscriberInterest) -> mpsc::Receiver<Notification> {
        let (tx, rx) = mpsc::channel(256);
        self.subscribers.insert(name.into(), Subscriber { interest, outbox: tx });
        rx
    }

    pub fn unsubscribe(&self, name: &str) {
        self.subscribers.remove(name);
    }

    pub fn update_interest(&self, name: &str, f: impl FnOnce(&mut SubscriberInterest)) {
        if let Some(mut entry) = self.subscribers.get_mut(name) {
            f(&mut entry.interest);
        }
    }

    /// Dispatch a compressed batch to every matching subscriber. Debug
    /// subscribers additionally receive a `Debug`-kind wrapper of each
    /// delivered notification.
    pub fn dispatch(&self, notifications: &[Notification]) {
        for entry in self.subscribers.iter() {
            let name = entry.key();
            let subscriber = entry.value();
            for n in notifications {
                if !subscriber.interest.wants(n) {
                    continue;
                }
                if subscriber.outbox.try_send(n.clone()).is_err() {
                    debug!(subscriber = %name, "dropping notification, outbox full or closed");
                }
                if subscriber.interest.want_debug_notifications {
                    let mut wrapped = n.clone();
                    wrapped.kind = NotificationType::Debug;
                    let _ = subscriber.outbox.try_send(wrapped);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::types::{EntityRef, Operation};

    #[tokio::test]
    async fn delivers_to_a_matching_collection_subscriber() {
        let hub = FanoutHub::new();
        let interest = SubscriberInterest {
            session: "other".into(),
            monitored_collections: [10].into_iter().collect(),
            ..Default::default()
        };
        let mut rx = hub.subscribe("agent", interest);
        let n = Notification::new(NotificationType::Item, Operation::Add, "writer").with_parent(10);
        hub.dispatch(&[n]);
        let received = rx.recv().await.expect("notification delivered");
        assert_eq!(received.parent, Some(10));
    }

    #[tokio::test]
    async fn suppresses_self_originated_notifications_unless_exclusive() {
        let hub = FanoutHub::new();
        let interest = SubscriberInterest {
            session: "writer".into(),
            all_monitored: true,
            ..Default::default()
        };
        let mut rx = hub.subscribe("writer-agent", interest);
        let n = Notification::new(NotificationType::Item, Operation::Add, "writer")
            .with_entity(EntityRef::by_id(1));
        hub.dispatch(&[n]);
        assert!(rx.try_recv().is_err());
    }
}
