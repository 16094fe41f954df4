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

//! Notification compression (§4.6): merge notifications from the same
//! transaction batch that describe the same logical change so
//! subscribers see one event instead of a flood of near-duplicates.
//!
//! Only Collection notifications are coalesced; Item notifications are
//! passed through untouched and in order. Within Collection
//! notifications, merging is tail-first: a new notification is matched
//! against the most recently emitted compatible entries first, within a
//! bounded lookback, so a burst of modifications to the same target
//! collapses onto one slot instead of growing a new entry each time,
//! even when a few unrelated notifications were interleaved in between.
//! A Modify whose target collection was Added earlier in the same batch
//! is dropped outright rather than merged, since the Add already
//! carries the collection's current state.

use std::collections::HashSet;

use crate::model::Id;

use super::types::{Notification, NotificationType, Operation};

fn merge_key(n: &Notification) -> (Operation, Option<Id>) {
    (n.operation, n.target_collection())
}

fn mergeable(a: &Notification, b: &Notification) -> bool {
    a.kind == NotificationType::Collection
        && b.kind == NotificationType::Collection
        && merge_key(a) == merge_key(b)
        && a.resource == b.resource
        && a.destination_resource == b.destination_resource
}

fn merge_into(target: &mut Notification, incoming: Notification) {
    for item in incoming.items {
        if !target.items.iter().any(|existing| existing.id == item.id) {
            target.items.push(item);
        }
    }
    for part in incoming.changed_parts {
        if !target.changed_parts.contains(&part) {
            target.changed_parts.push(part);
        }
    }
    for flag in incoming.added_flags {
        if !target.added_flags.contains(&flag) {
            target.added_flags.push(flag);
        }
    }
    for flag in incoming.removed_flags {
        if !target.removed_flags.contains(&flag) {
            target.removed_flags.push(flag);
        }
    }
    for tag in incoming.added_tags {
        if !target.added_tags.contains(&tag) {
            target.added_tags.push(tag);
        }
    }
    for tag in incoming.removed_tags {
        if !target.removed_tags.contains(&tag) {
            target.removed_tags.push(tag);
        }
    }
}

/// How far back from the tail to search for a merge target before
/// giving up and appending a new entry. Bounded so compression stays
/// linear-ish even for a large batch with little actual redundancy.
const MERGE_LOOKBACK: usize = 8;

pub fn compress(notifications: Vec<Notification>) -> Vec<Notification> {
    let mut out: Vec<Notification> = Vec::with_capacity(notifications.len());
    let mut added_collections: HashSet<Id> = HashSet::new();
    'next: for n in notifications {
        if n.kind != NotificationType::Collection {
            out.push(n);
            continue;
        }

        if n.operation == Operation::Add {
            if let Some(id) = n.target_collection() {
                added_collections.insert(id);
            }
            out.push(n);
            continue;
        }

        if n.operation == Operation::Modify {
            if let Some(id) = n.target_collection() {
                if added_collections.contains(&id) {
                    continue 'next;
                }
            }
        }

        let floor = out.len().saturating_sub(MERGE_LOOKBACK);
        for idx in (floor..out.len()).rev() {
            if mergeable(&out[idx], &n) {
                let target = &mut out[idx];
                let session = n.session.clone();
                merge_into(target, n);
                target.session = session;
                continue 'next;
            }
        }
        out.push(n);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::types::EntityRef;

    #[test]
    fn merges_consecutive_modifies_on_the_same_collection() {
        let a = Notification::new(NotificationType::Collection, Operation::Modify, "s1")
            .with_entity(EntityRef::by_id(10))
            .with_changed_parts(vec!["ATR:name".into()]);
        let b = Notification::new(NotificationType::Collection, Operation::Modify, "s1")
            .with_entity(EntityRef::by_id(10))
            .with_changed_parts(vec!["ATR:cachePolicy".into()]);
        let out = compress(vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].changed_parts, vec!["ATR:name".to_string(), "ATR:cachePolicy".to_string()]);
    }

    #[test]
    fn does_not_merge_modifies_for_different_collections() {
        let a = Notification::new(NotificationType::Collection, Operation::Modify, "s1").with_entity(EntityRef::by_id(10));
        let b = Notification::new(NotificationType::Collection, Operation::Modify, "s1").with_entity(EntityRef::by_id(20));
        let out = compress(vec![a, b]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn tail_first_lookback_merges_past_an_interleaved_notification() {
        let a = Notification::new(NotificationType::Collection, Operation::Modify, "s1").with_entity(EntityRef::by_id(10));
        let between = Notification::new(NotificationType::Collection, Operation::Modify, "s1").with_entity(EntityRef::by_id(20));
        let c = Notification::new(NotificationType::Collection, Operation::Modify, "s1").with_entity(EntityRef::by_id(10));
        let out = compress(vec![a, between, c]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn drops_a_modify_whose_collection_was_just_added() {
        let add = Notification::new(NotificationType::Collection, Operation::Add, "s1").with_entity(EntityRef::by_id(10));
        let modify = Notification::new(NotificationType::Collection, Operation::Modify, "s1")
            .with_entity(EntityRef::by_id(10))
            .with_changed_parts(vec!["ATR:name".into()]);
        let out = compress(vec![add, modify]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].operation, Operation::Add);
    }

    #[test]
    fn item_notifications_are_never_merged() {
        let a = Notification::new(NotificationType::Item, Operation::ModifyFlags, "s1")
            .with_parent(10)
            .with_entity(EntityRef::by_id(1));
        let b = Notification::new(NotificationType::Item, Operation::ModifyFlags, "s1")
            .with_parent(10)
            .with_entity(EntityRef::by_id(1));
        let out = compress(vec![a, b]);
        assert_eq!(out.len(), 2);
    }
}
