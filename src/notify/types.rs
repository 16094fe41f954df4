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

//! The notification value types (§4.6). Kept dependency-free of the
//! collector/fan-out machinery so the store façade can construct and
//! buffer these during a transaction without depending on the
//! subscriber layer.

use crate::model::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    Item,
    Collection,
    Tag,
    Relation,
    Subscription,
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Modify,
    ModifyFlags,
    ModifyTags,
    ModifyRelations,
    Move,
    Remove,
    Link,
    Unlink,
    Subscribe,
    Unsubscribe,
}

/// Enough identity about a changed entity for a subscriber to act on it
/// without a round-trip fetch (§4.6).
#[derive(Debug, Clone, Default)]
pub struct EntityRef {
    pub id: Id,
    pub remote_id: Option<String>,
    pub remote_revision: Option<String>,
    pub mime_type: Option<String>,
}

impl EntityRef {
    pub fn by_id(id: Id) -> Self {
        EntityRef {
            id,
            ..Default::default()
        }
    }
}

/// A single committed-transaction effect (§4.6). `items` holds one entry
/// per affected entity for Item notifications; collection/tag/relation
/// notifications keep the one-entity-per-notification constraint (§9
/// Open Questions) so `items` is a singleton for those types.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationType,
    pub operation: Operation,
    pub items: Vec<EntityRef>,
    pub parent: Option<Id>,
    pub parent_dest: Option<Id>,
    pub resource: Option<String>,
    pub destination_resource: Option<String>,
    pub changed_parts: Vec<String>,
    pub added_flags: Vec<String>,
    pub removed_flags: Vec<String>,
    pub added_tags: Vec<Id>,
    pub removed_tags: Vec<Id>,
    pub session: String,
}

impl Notification {
    pub fn new(kind: NotificationType, operation: Operation, session: impl Into<String>) -> Self {
        Notification {
            kind,
            operation,
            items: Vec::new(),
            parent: None,
            parent_dest: None,
            resource: None,
            destination_resource: None,
            changed_parts: Vec::new(),
            added_flags: Vec::new(),
            removed_flags: Vec::new(),
            added_tags: Vec::new(),
            removed_tags: Vec::new(),
            session: session.into(),
        }
    }

    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.items.push(entity);
        self
    }

    pub fn with_parent(mut self, parent: Id) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_parent_dest(mut self, parent_dest: Id) -> Self {
        self.parent_dest = Some(parent_dest);
        self
    }

    pub fn with_changed_parts(mut self, parts: Vec<String>) -> Self {
        self.changed_parts = parts;
        self
    }

    /// Identity used by the compressor to decide whether two
    /// notifications target the "same collection" for merging purposes.
    pub fn target_collection(&self) -> Option<Id> {
        if self.kind == NotificationType::Collection {
            self.items.first().map(|e| e.id)
        } else {
            None
        }
    }
}
