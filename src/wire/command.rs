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

//! `Command`: the tagged union of request kinds (§4.2). Each variant
//! owns its own wire representation; there is no base-class dispatch.

use bytes::BytesMut;

use crate::model::{AncestorDepth, CachePolicy, FetchScope, PersistentSearch, Scope, ScopeContext, Tristate};

use super::primitives::*;

fn encode_tristate(buf: &mut BytesMut, t: Tristate) {
    put_u8(
        buf,
        match t {
            Tristate::Undefined => 0,
            Tristate::True => 1,
            Tristate::False => 2,
        },
    );
}

fn decode_tristate(r: &mut Reader) -> Option<Tristate> {
    match r.read_u8()? {
        0 => Some(Tristate::Undefined),
        1 => Some(Tristate::True),
        2 => Some(Tristate::False),
        _ => None,
    }
}

fn encode_cache_policy(buf: &mut BytesMut, p: &CachePolicy) {
    put_bool(buf, p.inherit);
    encode_tristate(buf, p.sync_pref);
    put_bool(buf, p.check_interval_secs.is_some());
    if let Some(v) = p.check_interval_secs {
        put_i64(buf, v as i64);
    }
    put_str_vec(buf, &p.cached_parts);
    put_bool(buf, p.cache_timeout_secs.is_some());
    if let Some(v) = p.cache_timeout_secs {
        put_i64(buf, v as i64);
    }
}

fn decode_cache_policy(r: &mut Reader) -> Option<CachePolicy> {
    Some(CachePolicy {
        inherit: r.read_bool()?,
        sync_pref: decode_tristate(r)?,
        check_interval_secs: if r.read_bool()? { Some(r.read_i64()? as u64) } else { None },
        cached_parts: r.read_str_vec()?,
        cache_timeout_secs: if r.read_bool()? { Some(r.read_i64()? as u64) } else { None },
    })
}

fn encode_persistent_search(buf: &mut BytesMut, p: &PersistentSearch) {
    put_str(buf, &p.query);
    put_id_vec(buf, &p.source_collections);
    put_bool(buf, p.remote_search);
    put_bool(buf, p.recursive);
}

fn decode_persistent_search(r: &mut Reader) -> Option<PersistentSearch> {
    Some(PersistentSearch {
        query: r.read_str()?,
        source_collections: r.read_id_vec()?,
        remote_search: r.read_bool()?,
        recursive: r.read_bool()?,
    })
}

/// The four entity kinds that Move/Copy/Delete/Link commands apply to
/// uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    Collection,
    Tag,
    Relation,
}

impl EntityKind {
    fn to_u8(self) -> u8 {
        match self {
            EntityKind::Item => 0,
            EntityKind::Collection => 1,
            EntityKind::Tag => 2,
            EntityKind::Relation => 3,
        }
    }

    fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(EntityKind::Item),
            1 => Some(EntityKind::Collection),
            2 => Some(EntityKind::Tag),
            3 => Some(EntityKind::Relation),
            _ => None,
        }
    }
}

fn encode_scope(buf: &mut BytesMut, scope: &Scope) {
    match scope {
        Scope::Uid(ids) => {
            put_u8(buf, 0);
            put_id_vec(buf, ids);
        }
        Scope::Rid(rids) => {
            put_u8(buf, 1);
            put_str_vec(buf, rids);
        }
        Scope::HierarchicalRid(chain) => {
            put_u8(buf, 2);
            put_str_vec(buf, chain);
        }
        Scope::Gid(gids) => {
            put_u8(buf, 3);
            put_str_vec(buf, gids);
        }
    }
}

fn decode_scope(r: &mut Reader) -> Option<Scope> {
    match r.read_u8()? {
        0 => Some(Scope::Uid(r.read_id_vec()?)),
        1 => Some(Scope::Rid(r.read_str_vec()?)),
        2 => Some(Scope::HierarchicalRid(r.read_str_vec()?)),
        3 => Some(Scope::Gid(r.read_str_vec()?)),
        _ => None,
    }
}

fn encode_scope_context(buf: &mut BytesMut, ctx: &ScopeContext) {
    put_bool(buf, ctx.collection.is_some());
    if let Some(crate::model::IdOrRid::Id(id)) = &ctx.collection {
        put_bool(buf, true);
        put_i64(buf, *id);
    } else if let Some(crate::model::IdOrRid::Rid(rid)) = &ctx.collection {
        put_bool(buf, false);
        put_str(buf, rid);
    }
}

fn decode_scope_context(r: &mut Reader) -> Option<ScopeContext> {
    let has_collection = r.read_bool()?;
    let collection = if has_collection {
        if r.read_bool()? {
            Some(crate::model::IdOrRid::Id(r.read_i64()?))
        } else {
            Some(crate::model::IdOrRid::Rid(r.read_str()?))
        }
    } else {
        None
    };
    Some(ScopeContext {
        collection,
        tag: None,
    })
}

fn encode_fetch_scope(buf: &mut BytesMut, fs: &FetchScope) {
    put_str_vec(buf, &fs.part_names);
    put_bool(buf, fs.full_payload);
    put_u8(
        buf,
        match fs.ancestor_depth {
            AncestorDepth::None => 0,
            AncestorDepth::Parent => 1,
            AncestorDepth::All => 2,
        },
    );
    put_bool(buf, fs.cache_only);
    put_bool(buf, fs.ignore_errors);
    put_bool(buf, fs.check_cached_payload_parts_only);
    put_bool(buf, fs.changed_since.is_some());
    if let Some(ts) = fs.changed_since {
        put_i64(buf, ts);
    }
    put_bool(buf, fs.trusted_indexer);
}

fn decode_fetch_scope(r: &mut Reader) -> Option<FetchScope> {
    let part_names = r.read_str_vec()?;
    let full_payload = r.read_bool()?;
    let ancestor_depth = match r.read_u8()? {
        0 => AncestorDepth::None,
        1 => AncestorDepth::Parent,
        _ => AncestorDepth::All,
    };
    let cache_only = r.read_bool()?;
    let ignore_errors = r.read_bool()?;
    let check_cached_payload_parts_only = r.read_bool()?;
    let has_changed_since = r.read_bool()?;
    let changed_since = if has_changed_since {
        Some(r.read_i64()?)
    } else {
        None
    };
    let trusted_indexer = r.read_bool()?;
    Some(FetchScope {
        part_names,
        full_payload,
        ancestor_depth,
        cache_only,
        ignore_errors,
        check_cached_payload_parts_only,
        changed_since,
        trusted_indexer,
    })
}

/// Bitmap of which `ModifyItem` fields are present, mirroring §4.4's
/// "a bitmap enumerates which fields are present". Set-overwrite and
/// delta forms are mutually exclusive per field by construction: the
/// struct only has one slot for each.
#[derive(Debug, Clone, Default)]
pub struct ModifyItemFields {
    pub flags: Option<Vec<String>>,
    pub added_flags: Vec<String>,
    pub removed_flags: Vec<String>,
    pub tags: Option<Vec<i64>>,
    pub added_tags: Vec<i64>,
    pub removed_tags: Vec<i64>,
    pub remote_id: Option<String>,
    pub remote_revision: Option<String>,
    pub gid: Option<String>,
    pub size: Option<u64>,
    pub parts: Vec<(String, Vec<u8>)>,
    pub removed_parts: Vec<String>,
    pub attributes: Vec<(String, Vec<u8>)>,
    pub old_revision: Option<i64>,
    pub dirty: bool,
    pub invalidate_cache: bool,
    pub no_response: bool,
    pub notify: bool,
}

impl ModifyItemFields {
    fn encode(&self, buf: &mut BytesMut) {
        put_bool(buf, self.flags.is_some());
        if let Some(f) = &self.flags {
            put_str_vec(buf, f);
        }
        put_str_vec(buf, &self.added_flags);
        put_str_vec(buf, &self.removed_flags);
        put_bool(buf, self.tags.is_some());
        if let Some(t) = &self.tags {
            put_id_vec(buf, t);
        }
        put_id_vec(buf, &self.added_tags);
        put_id_vec(buf, &self.removed_tags);
        put_bool(buf, self.remote_id.is_some());
        if let Some(v) = &self.remote_id {
            put_str(buf, v);
        }
        put_bool(buf, self.remote_revision.is_some());
        if let Some(v) = &self.remote_revision {
            put_str(buf, v);
        }
        put_bool(buf, self.gid.is_some());
        if let Some(v) = &self.gid {
            put_str(buf, v);
        }
        put_bool(buf, self.size.is_some());
        if let Some(v) = self.size {
            put_i64(buf, v as i64);
        }
        put_i32(buf, self.parts.len() as i32);
        for (name, bytes) in &self.parts {
            put_str(buf, name);
            put_bytes(buf, bytes);
        }
        put_str_vec(buf, &self.removed_parts);
        put_i32(buf, self.attributes.len() as i32);
        for (k, v) in &self.attributes {
            put_str(buf, k);
            put_bytes(buf, v);
        }
        put_bool(buf, self.old_revision.is_some());
        if let Some(v) = self.old_revision {
            put_i64(buf, v);
        }
        put_bool(buf, self.dirty);
        put_bool(buf, self.invalidate_cache);
        put_bool(buf, self.no_response);
        put_bool(buf, self.notify);
    }

    fn decode(r: &mut Reader) -> Option<Self> {
        let flags = if r.read_bool()? {
            Some(r.read_str_vec()?)
        } else {
            None
        };
        let added_flags = r.read_str_vec()?;
        let removed_flags = r.read_str_vec()?;
        let tags = if r.read_bool()? {
            Some(r.read_id_vec()?)
        } else {
            None
        };
        let added_tags = r.read_id_vec()?;
        let removed_tags = r.read_id_vec()?;
        let remote_id = if r.read_bool()? {
            Some(r.read_str()?)
        } else {
            None
        };
        let remote_revision = if r.read_bool()? {
            Some(r.read_str()?)
        } else {
            None
        };
        let gid = if r.read_bool()? {
            Some(r.read_str()?)
        } else {
            None
        };
        let size = if r.read_bool()? {
            Some(r.read_i64()? as u64)
        } else {
            None
        };
        let part_count = r.read_i32()? as usize;
        let mut parts = Vec::with_capacity(part_count.min(1024));
        for _ in 0..part_count {
            parts.push((r.read_str()?, r.read_bytes()?));
        }
        let removed_parts = r.read_str_vec()?;
        let attr_count = r.read_i32()? as usize;
        let mut attributes = Vec::with_capacity(attr_count.min(1024));
        for _ in 0..attr_count {
            attributes.push((r.read_str()?, r.read_bytes()?));
        }
        let old_revision = if r.read_bool()? {
            Some(r.read_i64()?)
        } else {
            None
        };
        let dirty = r.read_bool()?;
        let invalidate_cache = r.read_bool()?;
        let no_response = r.read_bool()?;
        let notify = r.read_bool()?;
        Some(ModifyItemFields {
            flags,
            added_flags,
            removed_flags,
            tags,
            added_tags,
            removed_tags,
            remote_id,
            remote_revision,
            gid,
            size,
            parts,
            removed_parts,
            attributes,
            old_revision,
            dirty,
            invalidate_cache,
            no_response,
            notify,
        })
    }
}

/// Filter deltas for `ModifySubscription` (§4.7): each field is an
/// incremental start/stop pair, not a full replacement set.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionDelta {
    pub start_monitoring_collections: Vec<i64>,
    pub stop_monitoring_collections: Vec<i64>,
    pub start_monitoring_items: Vec<i64>,
    pub stop_monitoring_items: Vec<i64>,
    pub start_monitoring_resources: Vec<String>,
    pub stop_monitoring_resources: Vec<String>,
    pub start_monitoring_mime_types: Vec<String>,
    pub stop_monitoring_mime_types: Vec<String>,
    pub start_ignoring_sessions: Vec<String>,
    pub stop_ignoring_sessions: Vec<String>,
    pub set_all_monitored: Option<bool>,
    pub set_exclusive: Option<bool>,
    pub want_debug_notifications: Option<bool>,
}

impl SubscriptionDelta {
    fn encode(&self, buf: &mut BytesMut) {
        put_id_vec(buf, &self.start_monitoring_collections);
        put_id_vec(buf, &self.stop_monitoring_collections);
        put_id_vec(buf, &self.start_monitoring_items);
        put_id_vec(buf, &self.stop_monitoring_items);
        put_str_vec(buf, &self.start_monitoring_resources);
        put_str_vec(buf, &self.stop_monitoring_resources);
        put_str_vec(buf, &self.start_monitoring_mime_types);
        put_str_vec(buf, &self.stop_monitoring_mime_types);
        put_str_vec(buf, &self.start_ignoring_sessions);
        put_str_vec(buf, &self.stop_ignoring_sessions);
        put_bool(buf, self.set_all_monitored.is_some());
        if let Some(v) = self.set_all_monitored {
            put_bool(buf, v);
        }
        put_bool(buf, self.set_exclusive.is_some());
        if let Some(v) = self.set_exclusive {
            put_bool(buf, v);
        }
        put_bool(buf, self.want_debug_notifications.is_some());
        if let Some(v) = self.want_debug_notifications {
            put_bool(buf, v);
        }
    }

    fn decode(r: &mut Reader) -> Option<Self> {
        Some(SubscriptionDelta {
            start_monitoring_collections: r.read_id_vec()?,
            stop_monitoring_collections: r.read_id_vec()?,
            start_monitoring_items: r.read_id_vec()?,
            stop_monitoring_items: r.read_id_vec()?,
            start_monitoring_resources: r.read_str_vec()?,
            stop_monitoring_resources: r.read_str_vec()?,
            start_monitoring_mime_types: r.read_str_vec()?,
            stop_monitoring_mime_types: r.read_str_vec()?,
            start_ignoring_sessions: r.read_str_vec()?,
            stop_ignoring_sessions: r.read_str_vec()?,
            set_all_monitored: if r.read_bool()? {
                Some(r.read_bool()?)
            } else {
                None
            },
            set_exclusive: if r.read_bool()? {
                Some(r.read_bool()?)
            } else {
                None
            },
            want_debug_notifications: if r.read_bool()? {
                Some(r.read_bool()?)
            } else {
                None
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateItemCmd {
    pub parent_id: i64,
    pub mime_type: String,
    pub remote_id: Option<String>,
    pub gid: Option<String>,
    pub flags: Vec<String>,
    pub parts: Vec<(String, Vec<u8>)>,
}

#[derive(Debug, Clone)]
pub struct CreateCollectionCmd {
    pub parent_id: i64,
    pub name: String,
    pub resource: String,
    pub mime_types: Vec<String>,
    pub remote_id: Option<String>,
    pub virtual_: bool,
}

/// Fields of a Modify collection command. Set-overwrite only, aside
/// from `attributes`/`removed_attributes` which are an additive delta
/// pair over the attribute bag, the same shape as an item's attribute
/// modify.
#[derive(Debug, Clone)]
pub struct ModifyCollectionCmd {
    pub id: i64,
    pub name: Option<String>,
    pub parent_id: Option<i64>,
    pub remote_id: Option<String>,
    pub remote_revision: Option<String>,
    pub mime_types: Option<Vec<String>>,
    pub enabled: Option<bool>,
    pub sync_pref: Option<Tristate>,
    pub display_pref: Option<Tristate>,
    pub index_pref: Option<Tristate>,
    pub cache_policy: Option<CachePolicy>,
    pub persistent_search: Option<PersistentSearch>,
    pub attributes: Vec<(String, Vec<u8>)>,
    pub removed_attributes: Vec<String>,
    pub referenced: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct DestinationCmd {
    pub kind: EntityKind,
    pub scope: Scope,
    pub context: ScopeContext,
    pub destination: i64,
}

#[derive(Debug, Clone)]
pub struct DeleteCmd {
    pub kind: EntityKind,
    pub scope: Scope,
    pub context: ScopeContext,
}

#[derive(Debug, Clone)]
pub struct LinkCmd {
    pub collection_id: i64,
    pub items: Scope,
}

#[derive(Debug, Clone)]
pub struct SearchCmd {
    pub query: String,
    pub mime_types: Vec<String>,
    pub collections: Vec<i64>,
}

/// The ~35-kind request union (§4.2). Discriminator assignment is
/// stable for the lifetime of the protocol; response kinds reuse the
/// same numbers with the high bit set (`Response::discriminator`).
#[derive(Debug, Clone)]
pub enum Command {
    Hello,
    Login { session_id: String },
    Logout,
    TransactionBegin,
    TransactionCommit,
    TransactionRollback,
    CreateItem(CreateItemCmd),
    FetchItems {
        scope: Scope,
        context: ScopeContext,
        fetch_scope: FetchScope,
    },
    ModifyItem {
        scope: Scope,
        context: ScopeContext,
        fields: ModifyItemFields,
    },
    Move(DestinationCmd),
    Copy(DestinationCmd),
    Delete(DeleteCmd),
    Link(LinkCmd),
    Unlink(LinkCmd),
    CreateCollection(CreateCollectionCmd),
    FetchCollections { scope: Scope, context: ScopeContext },
    ModifyCollection(ModifyCollectionCmd),
    CreateTag { gid: String, tag_type: String, parent_id: Option<i64> },
    FetchTags { scope: Scope },
    DeleteTag { scope: Scope },
    CreateRelation { left_id: i64, right_id: i64, relation_type: String },
    FetchRelations { item_id: i64, relation_type: Option<String> },
    DeleteRelation { left_id: i64, right_id: i64, relation_type: String },
    Search(SearchCmd),
    StoreSearch { name: String, search: SearchCmd },
    CreateSubscription { subscriber_name: String, session: String },
    ModifySubscription(SubscriptionDelta),
    StreamPayload { part_name: String, bytes: Vec<u8> },
}

impl Command {
    pub fn discriminator(&self) -> u8 {
        match self {
            Command::Hello => 1,
            Command::Login { .. } => 2,
            Command::Logout => 3,
            Command::TransactionBegin => 4,
            Command::TransactionCommit => 5,
            Command::TransactionRollback => 6,
            Command::CreateItem(_) => 7,
            Command::FetchItems { .. } => 8,
            Command::ModifyItem { .. } => 9,
            Command::Move(_) => 10,
            Command::Copy(_) => 11,
            Command::Delete(_) => 12,
            Command::Link(_) => 13,
            Command::Unlink(_) => 14,
            Command::CreateCollection(_) => 15,
            Command::FetchCollections { .. } => 16,
            Command::ModifyCollection(_) => 17,
            Command::CreateTag { .. } => 18,
            Command::FetchTags { .. } => 19,
            Command::DeleteTag { .. } => 20,
            Command::CreateRelation { .. } => 21,
            Command::FetchRelations { .. } => 22,
            Command::DeleteRelation { .. } => 23,
            Command::Search(_) => 24,
            Command::StoreSearch { .. } => 25,
            Command::CreateSubscription { .. } => 26,
            Command::ModifySubscription(_) => 27,
            Command::StreamPayload { .. } => 28,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Command::Hello | Command::Logout | Command::TransactionBegin
            | Command::TransactionCommit | Command::TransactionRollback => {}
            Command::Login { session_id } => put_str(buf, session_id),
            Command::CreateItem(c) => {
                put_i64(buf, c.parent_id);
                put_str(buf, &c.mime_type);
                put_bool(buf, c.remote_id.is_some());
                if let Some(v) = &c.remote_id {
                    put_str(buf, v);
                }
                put_bool(buf, c.gid.is_some());
                if let Some(v) = &c.gid {
                    put_str(buf, v);
                }
                put_str_vec(buf, &c.flags);
                put_i32(buf, c.parts.len() as i32);
                for (name, bytes) in &c.parts {
                    put_str(buf, name);
                    put_bytes(buf, bytes);
                }
            }
            Command::FetchItems { scope, context, fetch_scope } => {
                encode_scope(buf, scope);
                encode_scope_context(buf, context);
                encode_fetch_scope(buf, fetch_scope);
            }
            Command::ModifyItem { scope, context, fields } => {
                encode_scope(buf, scope);
                encode_scope_context(buf, context);
                fields.encode(buf);
            }
            Command::Move(d) | Command::Copy(d) => {
                put_u8(buf, d.kind.to_u8());
                encode_scope(buf, &d.scope);
                encode_scope_context(buf, &d.context);
                put_i64(buf, d.destination);
            }
            Command::Delete(d) => {
                put_u8(buf, d.kind.to_u8());
                encode_scope(buf, &d.scope);
                encode_scope_context(buf, &d.context);
            }
            Command::Link(l) | Command::Unlink(l) => {
                put_i64(buf, l.collection_id);
                encode_scope(buf, &l.items);
            }
            Command::CreateCollection(c) => {
                put_i64(buf, c.parent_id);
                put_str(buf, &c.name);
                put_str(buf, &c.resource);
                put_str_vec(buf, &c.mime_types);
                put_bool(buf, c.remote_id.is_some());
                if let Some(v) = &c.remote_id {
                    put_str(buf, v);
                }
                put_bool(buf, c.virtual_);
            }
            Command::FetchCollections { scope, context } => {
                encode_scope(buf, scope);
                encode_scope_context(buf, context);
            }
            Command::ModifyCollection(c) => {
                put_i64(buf, c.id);
                put_bool(buf, c.name.is_some());
                if let Some(v) = &c.name {
                    put_str(buf, v);
                }
                put_bool(buf, c.parent_id.is_some());
                if let Some(v) = c.parent_id {
                    put_i64(buf, v);
                }
                put_bool(buf, c.remote_id.is_some());
                if let Some(v) = &c.remote_id {
                    put_str(buf, v);
                }
                put_bool(buf, c.remote_revision.is_some());
                if let Some(v) = &c.remote_revision {
                    put_str(buf, v);
                }
                put_bool(buf, c.mime_types.is_some());
                if let Some(v) = &c.mime_types {
                    put_str_vec(buf, v);
                }
                put_bool(buf, c.enabled.is_some());
                if let Some(v) = c.enabled {
                    put_bool(buf, v);
                }
                put_bool(buf, c.sync_pref.is_some());
                if let Some(v) = c.sync_pref {
                    encode_tristate(buf, v);
                }
                put_bool(buf, c.display_pref.is_some());
                if let Some(v) = c.display_pref {
                    encode_tristate(buf, v);
                }
                put_bool(buf, c.index_pref.is_some());
                if let Some(v) = c.index_pref {
                    encode_tristate(buf, v);
                }
                put_bool(buf, c.cache_policy.is_some());
                if let Some(v) = &c.cache_policy {
                    encode_cache_policy(buf, v);
                }
                put_bool(buf, c.persistent_search.is_some());
                if let Some(v) = &c.persistent_search {
                    encode_persistent_search(buf, v);
                }
                put_i32(buf, c.attributes.len() as i32);
                for (k, v) in &c.attributes {
                    put_str(buf, k);
                    put_bytes(buf, v);
                }
                put_str_vec(buf, &c.removed_attributes);
                put_bool(buf, c.referenced.is_some());
                if let Some(v) = c.referenced {
                    put_bool(buf, v);
                }
            }
            Command::CreateTag { gid, tag_type, parent_id } => {
                put_str(buf, gid);
                put_str(buf, tag_type);
                put_bool(buf, parent_id.is_some());
                if let Some(v) = parent_id {
                    put_i64(buf, *v);
                }
            }
            Command::FetchTags { scope } => encode_scope(buf, scope),
            Command::DeleteTag { scope } => encode_scope(buf, scope),
            Command::CreateRelation { left_id, right_id, relation_type } => {
                put_i64(buf, *left_id);
                put_i64(buf, *right_id);
                put_str(buf, relation_type);
            }
            Command::FetchRelations { item_id, relation_type } => {
                put_i64(buf, *item_id);
                put_bool(buf, relation_type.is_some());
                if let Some(v) = relation_type {
                    put_str(buf, v);
                }
            }
            Command::DeleteRelation { left_id, right_id, relation_type } => {
                put_i64(buf, *left_id);
                put_i64(buf, *right_id);
                put_str(buf, relation_type);
            }
            Command::Search(s) | Command::StoreSearch { search: s, .. } => {
                if let Command::StoreSearch { name, .. } = self {
                    put_str(buf, name);
                }
                put_str(buf, &s.query);
                put_str_vec(buf, &s.mime_types);
                put_id_vec(buf, &s.collections);
            }
            Command::CreateSubscription { subscriber_name, session } => {
                put_str(buf, subscriber_name);
                put_str(buf, session);
            }
            Command::ModifySubscription(delta) => delta.encode(buf),
            Command::StreamPayload { part_name, bytes } => {
                put_str(buf, part_name);
                put_bytes(buf, bytes);
            }
        }
    }

    pub fn decode(discriminator: u8, r: &mut Reader) -> Option<Command> {
        Some(match discriminator {
            1 => Command::Hello,
            2 => Command::Login { session_id: r.read_str()? },
            3 => Command::Logout,
            4 => Command::TransactionBegin,
            5 => Command::TransactionCommit,
            6 => Command::TransactionRollback,
            7 => {
                let parent_id = r.read_i64()?;
                let mime_type = r.read_str()?;
                let remote_id = if r.read_bool()? { Some(r.read_str()?) } else { None };
                let gid = if r.read_bool()? { Some(r.read_str()?) } else { None };
                let flags = r.read_str_vec()?;
                let part_count = r.read_i32()? as usize;
                let mut parts = Vec::with_capacity(part_count.min(1024));
                for _ in 0..part_count {
                    parts.push((r.read_str()?, r.read_bytes()?));
                }
                Command::CreateItem(CreateItemCmd {
                    parent_id,
                    mime_type,
                    remote_id,
                    gid,
                    flags,
                    parts,
                })
            }
            8 => Command::FetchItems {
                scope: decode_scope(r)?,
                context: decode_scope_context(r)?,
                fetch_scope: decode_fetch_scope(r)?,
            },
            9 => Command::ModifyItem {
                scope: decode_scope(r)?,
                context: decode_scope_context(r)?,
                fields: ModifyItemFields::decode(r)?,
            },
            10 | 11 => {
                let kind = EntityKind::from_u8(r.read_u8()?)?;
                let scope = decode_scope(r)?;
                let context = decode_scope_context(r)?;
                let destination = r.read_i64()?;
                let d = DestinationCmd { kind, scope, context, destination };
                if discriminator == 10 {
                    Command::Move(d)
                } else {
                    Command::Copy(d)
                }
            }
            12 => {
                let kind = EntityKind::from_u8(r.read_u8()?)?;
                let scope = decode_scope(r)?;
                let context = decode_scope_context(r)?;
                Command::Delete(DeleteCmd { kind, scope, context })
            }
            13 | 14 => {
                let collection_id = r.read_i64()?;
                let items = decode_scope(r)?;
                let l = LinkCmd { collection_id, items };
                if discriminator == 13 {
                    Command::Link(l)
                } else {
                    Command::Unlink(l)
                }
            }
            15 => {
                let parent_id = r.read_i64()?;
                let name = r.read_str()?;
                let resource = r.read_str()?;
                let mime_types = r.read_str_vec()?;
                let remote_id = if r.read_bool()? { Some(r.read_str()?) } else { None };
                let virtual_ = r.read_bool()?;
                Command::CreateCollection(CreateCollectionCmd {
                    parent_id,
                    name,
                    resource,
                    mime_types,
                    remote_id,
                    virtual_,
                })
            }
            16 => Command::FetchCollections {
                scope: decode_scope(r)?,
                context: decode_scope_context(r)?,
            },
            17 => {
                let id = r.read_i64()?;
                let name = if r.read_bool()? { Some(r.read_str()?) } else { None };
                let parent_id = if r.read_bool()? { Some(r.read_i64()?) } else { None };
                let remote_id = if r.read_bool()? { Some(r.read_str()?) } else { None };
                let remote_revision = if r.read_bool()? { Some(r.read_str()?) } else { None };
                let mime_types = if r.read_bool()? { Some(r.read_str_vec()?) } else { None };
                let enabled = if r.read_bool()? { Some(r.read_bool()?) } else { None };
                let sync_pref = if r.read_bool()? { Some(decode_tristate(r)?) } else { None };
                let display_pref = if r.read_bool()? { Some(decode_tristate(r)?) } else { None };
                let index_pref = if r.read_bool()? { Some(decode_tristate(r)?) } else { None };
                let cache_policy = if r.read_bool()? { Some(decode_cache_policy(r)?) } else { None };
                let persistent_search = if r.read_bool()? { Some(decode_persistent_search(r)?) } else { None };
                let attr_count = r.read_i32()? as usize;
                let mut attributes = Vec::with_capacity(attr_count.min(1024));
                for _ in 0..attr_count {
                    attributes.push((r.read_str()?, r.read_bytes()?));
                }
                let removed_attributes = r.read_str_vec()?;
                let referenced = if r.read_bool()? { Some(r.read_bool()?) } else { None };
                Command::ModifyCollection(ModifyCollectionCmd {
                    id,
                    name,
                    parent_id,
                    remote_id,
                    remote_revision,
                    mime_types,
                    enabled,
                    sync_pref,
                    display_pref,
                    index_pref,
                    cache_policy,
                    persistent_search,
                    attributes,
                    removed_attributes,
                    referenced,
                })
            }
            18 => {
                let gid = r.read_str()?;
                let tag_type = r.read_str()?;
                let parent_id = if r.read_bool()? { Some(r.read_i64()?) } else { None };
                Command::CreateTag { gid, tag_type, parent_id }
            }
            19 => Command::FetchTags { scope: decode_scope(r)? },
            20 => Command::DeleteTag { scope: decode_scope(r)? },
            21 => Command::CreateRelation {
                left_id: r.read_i64()?,
                right_id: r.read_i64()?,
                relation_type: r.read_str()?,
            },
            22 => {
                let item_id = r.read_i64()?;
                let relation_type = if r.read_bool()? { Some(r.read_str()?) } else { None };
                Command::FetchRelations { item_id, relation_type }
            }
            23 => Command::DeleteRelation {
                left_id: r.read_i64()?,
                right_id: r.read_i64()?,
                relation_type: r.read_str()?,
            },
            24 => Command::Search(SearchCmd {
                query: r.read_str()?,
                mime_types: r.read_str_vec()?,
                collections: r.read_id_vec()?,
            }),
            25 => {
                let name = r.read_str()?;
                let query = r.read_str()?;
                let mime_types = r.read_str_vec()?;
                let collections = r.read_id_vec()?;
                Command::StoreSearch {
                    name,
                    search: SearchCmd { query, mime_types, collections },
                }
            }
            26 => Command::CreateSubscription {
                subscriber_name: r.read_str()?,
                session: r.read_str()?,
            },
            27 => Command::ModifySubscription(SubscriptionDelta::decode(r)?),
            28 => Command::StreamPayload {
                part_name: r.read_str()?,
                bytes: r.read_bytes()?,
            },
            _ => return None,
        })
    }
}
