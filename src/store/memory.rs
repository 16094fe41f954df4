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

//! The in-memory arena the store façade transacts over. Entities are
//! referenced by id, never by owned pointer (§9): a collection's
//! children, an item's tags, a relation's endpoints are all looked up
//! through the arena's maps rather than embedded.

use std::collections::{HashMap, HashSet};

use crate::model::{
    Collection, Id, Item, Relation, RelationKey, Resource, Scope, ScopeContext, Tag, IdOrRid, ROOT_ID,
};

/// The full entity set the store transacts over. Cheap-ish to clone: a
/// transaction snapshots this on `begin` and swaps it back on `commit`,
/// which keeps rollback trivial at the cost of a full copy per
/// transaction. Fine for the core's scope (no query planner, no
/// on-disk paging); a production store would replace this with
/// persistent data structures or a real relational backend.
#[derive(Debug, Clone, Default)]
pub struct Db {
    pub collections: HashMap<Id, Collection>,
    pub items: HashMap<Id, Item>,
    pub tags: HashMap<Id, Tag>,
    pub relations: HashMap<RelationKey, Relation>,
    pub resources: HashMap<Id, Resource>,
    /// Virtual-collection membership: collection id -> linked item ids.
    pub links: HashMap<Id, HashSet<Id>>,
    pub gid_index: HashMap<String, Id>,
}

impl Db {
    pub fn children_of(&self, parent_id: Id) -> Vec<Id> {
        self.collections
            .values()
            .filter(|c| c.parent_id == parent_id)
            .map(|c| c.id)
            .collect()
    }

    pub fn items_in(&self, collection_id: Id) -> Vec<Id> {
        self.items
            .values()
            .filter(|i| i.parent_id == collection_id)
            .map(|i| i.id)
            .collect()
    }

    /// Walk ancestors starting at `collection_id` (not included) up to
    /// the root, returning them nearest-first.
    pub fn ancestors_of(&self, collection_id: Id) -> Vec<Id> {
        let mut out = Vec::new();
        let mut current = self.collections.get(&collection_id).map(|c| c.parent_id);
        while let Some(id) = current {
            if id == ROOT_ID {
                break;
            }
            out.push(id);
            current = self.collections.get(&id).map(|c| c.parent_id);
        }
        out
    }

    /// Resolve the effective cache policy for a collection by walking
    /// ancestors until `inherit = false` or the root is reached (§4.1).
    pub fn effective_cache_policy(&self, collection_id: Id) -> crate::model::CachePolicy {
        let mut current = collection_id;
        loop {
            let Some(c) = self.collections.get(&current) else {
                return crate::model::CachePolicy::default();
            };
            if !c.cache_policy.inherit {
                return c.cache_policy.clone();
            }
            if c.parent_id == ROOT_ID {
                return c.cache_policy.clone();
            }
            current = c.parent_id;
        }
    }

    /// Resolve a collection id out of a scope context's `collection`
    /// field, which may itself be an id or a remote id in need of a
    /// lookup (Rid scopes are only unique within a resource, so the
    /// search narrows by resource when the context carries one).
    fn resolve_context_collection(&self, context: &ScopeContext) -> Option<Id> {
        match &context.collection {
            Some(IdOrRid::Id(id)) => Some(*id),
            Some(IdOrRid::Rid(rid)) => self
                .collections
                .values()
                .find(|c| c.remote_id.as_deref() == Some(rid.as_str()))
                .map(|c| c.id),
            None => None,
        }
    }

    /// Resolve a `Scope` against the item set (§6). `Rid`/`HierarchicalRid`
    /// scopes are narrowed to the context's collection when present,
    /// since remote ids are only unique within their owning collection.
    pub fn resolve_item_ids(&self, scope: &Scope, context: &ScopeContext) -> Vec<Id> {
        match scope {
            Scope::Uid(ids) => ids.iter().copied().filter(|id| self.items.contains_key(id)).collect(),
            Scope::Gid(gids) => gids.iter().filter_map(|g| self.gid_index.get(g).copied()).collect(),
            Scope::Rid(rids) | Scope::HierarchicalRid(rids) => {
                let parent = self.resolve_context_collection(context);
                rids.iter()
                    .filter_map(|rid| {
                        self.items
                            .values()
                            .find(|i| {
                                i.remote_id.as_deref() == Some(rid.as_str())
                                    && parent.map(|p| p == i.parent_id).unwrap_or(true)
                            })
                            .map(|i| i.id)
                    })
                    .collect()
            }
        }
    }

    /// Resolve a `Scope` against the collection set.
    pub fn resolve_collection_ids(&self, scope: &Scope, context: &ScopeContext) -> Vec<Id> {
        match scope {
            Scope::Uid(ids) => ids.iter().copied().filter(|id| self.collections.contains_key(id)).collect(),
            Scope::Gid(_) => Vec::new(),
            Scope::Rid(rids) | Scope::HierarchicalRid(rids) => {
                let parent = self.resolve_context_collection(context);
                rids.iter()
                    .filter_map(|rid| {
                        self.collections
                            .values()
                            .find(|c| {
                                c.remote_id.as_deref() == Some(rid.as_str())
                                    && parent.map(|p| p == c.parent_id).unwrap_or(true)
                            })
                            .map(|c| c.id)
                    })
                    .collect()
            }
        }
    }

    /// Resolve a `Scope` against the tag set, by id or by gid only —
    /// tags have no resource-scoped remote id concept in this core.
    pub fn resolve_tag_ids(&self, scope: &Scope) -> Vec<Id> {
        match scope {
            Scope::Uid(ids) => ids.iter().copied().filter(|id| self.tags.contains_key(id)).collect(),
            Scope::Gid(gids) => gids
                .iter()
                .filter_map(|g| self.tags.values().find(|t| &t.gid == g).map(|t| t.id))
                .collect(),
            Scope::Rid(rids) | Scope::HierarchicalRid(rids) => rids
                .iter()
                .filter_map(|rid| self.tags.values().find(|t| t.remote_id.as_deref() == Some(rid.as_str())).map(|t| t.id))
                .collect(),
        }
    }

    /// Whether `descendant` is `ancestor` or a transitive child of it —
    /// used to reject a collection move that would create a cycle.
    pub fn is_ancestor_or_self(&self, ancestor: Id, descendant: Id) -> bool {
        let mut current = descendant;
        loop {
            if current == ancestor {
                return true;
            }
            match self.collections.get(&current) {
                Some(c) if c.parent_id != ROOT_ID => current = c.parent_id,
                _ => return current == ancestor,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cache_policy::CachePolicy;
    use crate::model::Tristate;

    fn collection(id: Id, parent_id: Id) -> Collection {
        Collection {
            id,
            parent_id,
            name: format!("c{id}"),
            mime_types: Vec::new(),
            resource_id: 1,
            cache_policy: CachePolicy::default(),
            attributes: Default::default(),
            enabled: true,
            sync_pref: Tristate::Undefined,
            display_pref: Tristate::Undefined,
            index_pref: Tristate::Undefined,
            virtual_: false,
            referenced: false,
            persistent_search: None,
            remote_id: None,
            remote_revision: None,
        }
    }

    #[test]
    fn resolves_uid_scope_to_only_existing_items() {
        let mut db = Db::default();
        db.items.insert(1, crate::model::Item {
            id: 1,
            parent_id: ROOT_ID,
            mime_type: "text/plain".into(),
            remote_id: None,
            remote_revision: None,
            gid: None,
            size: 0,
            mtime: 0,
            atime: 0,
            revision: 0,
            flags: Default::default(),
            tags: Default::default(),
            parts: Default::default(),
            dirty: false,
        });
        let ids = db.resolve_item_ids(&Scope::Uid(vec![1, 2]), &ScopeContext::default());
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn rid_scope_narrows_by_context_collection() {
        let mut db = Db::default();
        db.collections.insert(10, collection(10, ROOT_ID));
        db.collections.insert(20, collection(20, ROOT_ID));
        let mut item_a = crate::model::Item {
            id: 1,
            parent_id: 10,
            mime_type: "text/plain".into(),
            remote_id: Some("R1".into()),
            remote_revision: None,
            gid: None,
            size: 0,
            mtime: 0,
            atime: 0,
            revision: 0,
            flags: Default::default(),
            tags: Default::default(),
            parts: Default::default(),
            dirty: false,
        };
        let mut item_b = item_a.clone();
        item_a.id = 1;
        item_b.id = 2;
        item_b.parent_id = 20;
        db.items.insert(1, item_a);
        db.items.insert(2, item_b);

        let context = ScopeContext { collection: Some(IdOrRid::Id(20)), tag: None };
        let ids = db.resolve_item_ids(&Scope::Rid(vec!["R1".into()]), &context);
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn is_ancestor_or_self_detects_transitive_ancestry() {
        let mut db = Db::default();
        db.collections.insert(1, collection(1, ROOT_ID));
        db.collections.insert(2, collection(2, 1));
        db.collections.insert(3, collection(3, 2));
        assert!(db.is_ancestor_or_self(1, 3));
        assert!(!db.is_ancestor_or_self(3, 1));
        assert!(db.is_ancestor_or_self(3, 3));
    }

    #[test]
    fn effective_cache_policy_stops_at_first_non_inheriting_ancestor() {
        let mut db = Db::default();
        let mut root_child = collection(1, ROOT_ID);
        root_child.cache_policy = CachePolicy { inherit: false, check_interval_secs: Some(42), ..Default::default() };
        db.collections.insert(1, root_child);

        let mut leaf = collection(2, 1);
        leaf.cache_policy.inherit = true;
        db.collections.insert(2, leaf);

        let policy = db.effective_cache_policy(2);
        assert_eq!(policy.check_interval_secs, Some(42));
    }
}
