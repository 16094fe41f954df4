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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::connection::Connection;
use crate::error::{Result, VesselError};
use crate::model::part::{choose_storage, ATTRIBUTE_PREFIX};
use crate::model::{Collection, Id, IdOrRid, Item, Part, Scope, ScopeContext};
use crate::notify::{EntityRef, Notification, NotificationType, Operation};
use crate::store::{Store, Transaction};
use crate::wire::command::{CreateItemCmd, DeleteCmd, DestinationCmd, EntityKind, LinkCmd, ModifyItemFields};
use crate::wire::Response;

use super::run_in_txn;

fn now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

pub fn create(conn: &mut Connection, cmd: CreateItemCmd) -> Result<Response> {
    let store = conn.ctx.store.clone();
    let session = conn.session.clone();
    let item = run_in_txn(conn, |txn| {
        let parent = txn.db.collections.get(&cmd.parent_id).ok_or(VesselError::NotFound)?;
        if parent.virtual_ {
            return Err(VesselError::Constraint(
                "items cannot be created directly in a virtual collection".into(),
            ));
        }
        if let Some(gid) = &cmd.gid {
            if txn.db.gid_index.contains_key(gid) {
                return Err(VesselError::Constraint(format!("gid '{gid}' already in use")));
            }
        }

        let id = store.allocate_id();
        let mut parts = HashMap::with_capacity(cmd.parts.len());
        let mut size = 0u64;
        for (name, bytes) in &cmd.parts {
            size += bytes.len() as u64;
            let storage = choose_storage(bytes.clone(), store.external_threshold, |_| {
                store.allocate_external_file_name(0)
            });
            parts.insert(name.clone(), Part { name: name.clone(), storage, version: 0 });
        }

        let item = Item {
            id,
            parent_id: cmd.parent_id,
            mime_type: cmd.mime_type.clone(),
            remote_id: cmd.remote_id.clone(),
            remote_revision: None,
            gid: cmd.gid.clone(),
            size,
            mtime: now(),
            atime: now(),
            revision: 0,
            flags: cmd.flags.iter().cloned().collect(),
            tags: Default::default(),
            parts,
            dirty: false,
        };

        txn.db.items.insert(id, item.clone());
        if let Some(gid) = &cmd.gid {
            txn.db.gid_index.insert(gid.clone(), id);
        }

        txn.notify(
            Notification::new(NotificationType::Item, Operation::Add, session.clone())
                .with_parent(cmd.parent_id)
                .with_entity(EntityRef {
                    id,
                    remote_id: cmd.remote_id.clone(),
                    remote_revision: None,
                    mime_type: Some(cmd.mime_type.clone()),
                }),
        );

        Ok(item)
    })?;

    Ok(Response::Items(vec![item]))
}

pub async fn fetch(
    conn: &mut Connection,
    scope: Scope,
    context: ScopeContext,
    fetch_scope: crate::model::FetchScope,
) -> Result<Response> {
    let mut items = conn.ctx.store.read(|db| {
        let ids = db.resolve_item_ids(&scope, &context);
        ids.into_iter().filter_map(|id| db.items.get(&id).cloned()).collect::<Vec<_>>()
    })?;

    if fetch_scope.cache_only {
        return Ok(Response::Items(items));
    }

    for item in items.iter_mut() {
        let needs_retrieval = !fetch_scope.part_names.is_empty()
            && !fetch_scope
                .part_names
                .iter()
                .all(|name| item.parts.get(name).map(|p| p.is_cached()).unwrap_or(false));
        if !needs_retrieval {
            continue;
        }
        let resource_name = conn
            .ctx
            .store
            .read(|db| db.collections.get(&item.parent_id).and_then(|c| db.resources.get(&c.resource_id)).map(|r| r.name.clone()))?;
        let Some(resource_name) = resource_name else { continue };
        match conn.ctx.retrieval.retrieve(&resource_name, item, &fetch_scope).await {
            Ok(refreshed) => *item = refreshed,
            Err(e) if fetch_scope.ignore_errors => {
                tracing::warn!(item_id = item.id, error = %e, "ignoring retrieval failure");
            }
            Err(e) => return Err(e),
        }
    }

    if fetch_scope.bumps_atime() {
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        run_in_txn(conn, |txn| {
            for id in &ids {
                if let Some(item) = txn.db.items.get_mut(id) {
                    item.atime = now();
                }
            }
            Ok(())
        })?;
    }

    Ok(Response::Items(items))
}

pub fn modify(conn: &mut Connection, scope: Scope, context: ScopeContext, fields: ModifyItemFields) -> Result<Response> {
    let session = conn.session.clone();
    let items = run_in_txn(conn, |txn| {
        let ids = txn.db.resolve_item_ids(&scope, &context);
        if ids.is_empty() {
            return Err(VesselError::NotFound);
        }
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let mut notif = Notification::new(NotificationType::Item, Operation::Modify, session.clone());
            {
                let item = txn.db.items.get_mut(&id).ok_or(VesselError::NotFound)?;

                if let Some(old_revision) = fields.old_revision {
                    if item.revision != old_revision {
                        return Err(VesselError::Conflict { expected: old_revision, actual: item.revision });
                    }
                }

                let mut flags_changed = false;
                if let Some(new_flags) = &fields.flags {
                    item.flags = new_flags.iter().cloned().collect();
                    flags_changed = true;
                }
                for f in &fields.added_flags {
                    flags_changed |= item.flags.insert(f.clone());
                }
                for f in &fields.removed_flags {
                    flags_changed |= item.flags.remove(f);
                }

                let mut tags_changed = false;
                if let Some(new_tags) = &fields.tags {
                    item.tags = new_tags.iter().copied().collect();
                    tags_changed = true;
                }
                for t in &fields.added_tags {
                    tags_changed |= item.tags.insert(*t);
                }
                for t in &fields.removed_tags {
                    tags_changed |= item.tags.remove(t);
                }

                if let Some(rid) = &fields.remote_id {
                    item.remote_id = Some(rid.clone());
                }
                if let Some(rrev) = &fields.remote_revision {
                    item.remote_revision = Some(rrev.clone());
                }
                if let Some(gid) = &fields.gid {
                    item.gid = Some(gid.clone());
                }
                if let Some(size) = fields.size {
                    item.size = size;
                }

                for name in &fields.removed_parts {
                    item.parts.remove(name);
                }
                let mut changed_parts = Vec::new();
                for (name, bytes) in &fields.parts {
                    changed_parts.push(name.clone());
                    item.parts.insert(name.clone(), Part::new_inline(name.clone(), bytes.clone()));
                }
                for (name, bytes) in &fields.attributes {
                    let full_name = format!("{ATTRIBUTE_PREFIX}{name}");
                    changed_parts.push(full_name.clone());
                    item.parts.insert(full_name.clone(), Part::new_inline(full_name, bytes.clone()));
                }

                if fields.dirty {
                    item.dirty = true;
                }
                item.mtime = now();
                item.bump_revision();

                let parts_changed = !changed_parts.is_empty();
                notif.operation = if flags_changed && !tags_changed && !parts_changed {
                    Operation::ModifyFlags
                } else if tags_changed && !flags_changed && !parts_changed {
                    Operation::ModifyTags
                } else {
                    Operation::Modify
                };
                notif = notif
                    .with_parent(item.parent_id)
                    .with_changed_parts(changed_parts)
                    .with_entity(EntityRef {
                        id,
                        remote_id: item.remote_id.clone(),
                        remote_revision: item.remote_revision.clone(),
                        mime_type: Some(item.mime_type.clone()),
                    });
                notif.added_flags = fields.added_flags.clone();
                notif.removed_flags = fields.removed_flags.clone();
                notif.added_tags = fields.added_tags.clone();
                notif.removed_tags = fields.removed_tags.clone();

                results.push(item.clone());
            }
            txn.notify(notif);
        }
        Ok(results)
    })?;

    if fields.no_response {
        return Ok(Response::Ok);
    }
    Ok(Response::Items(items))
}

pub fn move_or_copy(conn: &mut Connection, cmd: DestinationCmd, copy: bool) -> Result<Response> {
    match cmd.kind {
        EntityKind::Item => move_or_copy_items(conn, cmd, copy),
        EntityKind::Collection => move_or_copy_collections(conn, cmd, copy),
        EntityKind::Tag | EntityKind::Relation => {
            Err(VesselError::Constraint("tags and relations have no destination-based move/copy".into()))
        }
    }
}

fn move_or_copy_items(conn: &mut Connection, cmd: DestinationCmd, copy: bool) -> Result<Response> {
    let store = conn.ctx.store.clone();
    let session = conn.session.clone();
    let items = run_in_txn(conn, |txn| {
        if !txn.db.collections.contains_key(&cmd.destination) {
            return Err(VesselError::NotFound);
        }
        let ids = txn.db.resolve_item_ids(&cmd.scope, &cmd.context);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let mut item = txn.db.items.get(&id).cloned().ok_or(VesselError::NotFound)?;
            let old_parent = item.parent_id;
            if copy {
                let new_id = store.allocate_id();
                item.id = new_id;
                item.parent_id = cmd.destination;
                item.revision = 0;
                txn.db.items.insert(new_id, item.clone());
            } else {
                item.parent_id = cmd.destination;
                txn.db.items.insert(id, item.clone());
            }
            txn.notify(
                Notification::new(NotificationType::Item, Operation::Move, session.clone())
                    .with_parent(old_parent)
                    .with_parent_dest(cmd.destination)
                    .with_entity(EntityRef::by_id(item.id)),
            );
            out.push(item);
        }
        Ok(out)
    })?;
    Ok(Response::Items(items))
}

/// Move or copy whole collections. A move within one resource is a
/// plain reparent: ids, remote identities and children are untouched.
/// A move across resources (or any copy) has no portable identity to
/// carry over, so it is replayed as a remove-in-source /
/// create-in-destination walk of the subtree via `replay_collection_tree`.
fn move_or_copy_collections(conn: &mut Connection, cmd: DestinationCmd, copy: bool) -> Result<Response> {
    let store = conn.ctx.store.clone();
    let session = conn.session.clone();
    let collections = run_in_txn(conn, |txn| {
        let dest_resource = txn.db.collections.get(&cmd.destination).ok_or(VesselError::NotFound)?.resource_id;
        let ids = txn.db.resolve_collection_ids(&cmd.scope, &cmd.context);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if txn.db.is_ancestor_or_self(id, cmd.destination) {
                return Err(VesselError::Constraint("move would create a collection cycle".into()));
            }
            let source = txn.db.collections.get(&id).cloned().ok_or(VesselError::NotFound)?;
            let old_parent = source.parent_id;

            let moved = if !copy && source.resource_id == dest_resource {
                let collection = txn.db.collections.get_mut(&id).ok_or(VesselError::NotFound)?;
                collection.parent_id = cmd.destination;
                collection.clone()
            } else {
                replay_collection_tree(&store, txn, id, cmd.destination, dest_resource, copy)?
            };

            txn.notify(
                Notification::new(NotificationType::Collection, Operation::Move, session.clone())
                    .with_parent(old_parent)
                    .with_parent_dest(cmd.destination)
                    .with_entity(EntityRef {
                        id: moved.id,
                        remote_id: moved.remote_id.clone(),
                        remote_revision: moved.remote_revision.clone(),
                        mime_type: None,
                    }),
            );
            out.push(moved);
        }
        Ok(out)
    })?;
    Ok(Response::Collections(collections))
}

/// Walk `root_id`'s subtree depth-first, recreating every collection
/// (and the items directly inside it) under `new_parent` in
/// `dest_resource` with freshly allocated ids, since neither ids nor
/// remote identities are portable across a resource boundary. The
/// source subtree is torn down afterward unless this is a copy.
fn replay_collection_tree(
    store: &Arc<Store>,
    txn: &mut Transaction,
    root_id: Id,
    new_parent: Id,
    dest_resource: Id,
    copy: bool,
) -> Result<Collection> {
    let mut order = Vec::new();
    collect_subtree(&txn.db, root_id, &mut order);

    let mut id_map: HashMap<Id, Id> = HashMap::with_capacity(order.len());
    for &old_id in &order {
        id_map.insert(old_id, store.allocate_id());
    }

    let mut new_root = None;
    for &old_id in &order {
        let mut collection = txn.db.collections.get(&old_id).cloned().ok_or(VesselError::NotFound)?;
        let new_id = id_map[&old_id];
        collection.id = new_id;
        collection.resource_id = dest_resource;
        collection.parent_id = if old_id == root_id { new_parent } else { id_map[&collection.parent_id] };
        collection.remote_id = None;
        collection.remote_revision = None;
        txn.db.collections.insert(new_id, collection.clone());

        for item_id in txn.db.items_in(old_id) {
            let mut item = txn.db.items.get(&item_id).cloned().ok_or(VesselError::NotFound)?;
            let new_item_id = store.allocate_id();
            item.id = new_item_id;
            item.parent_id = new_id;
            item.remote_id = None;
            item.remote_revision = None;
            item.revision = 0;
            txn.db.items.insert(new_item_id, item);
            if !copy {
                txn.db.items.remove(&item_id);
            }
        }

        if old_id == root_id {
            new_root = Some(collection);
        }
    }

    if !copy {
        for &old_id in order.iter().rev() {
            txn.db.collections.remove(&old_id);
        }
    }

    new_root.ok_or(VesselError::NotFound)
}

fn collect_subtree(db: &crate::store::Db, root: Id, out: &mut Vec<Id>) {
    out.push(root);
    for child in db.children_of(root) {
        collect_subtree(db, child, out);
    }
}

pub fn delete(conn: &mut Connection, cmd: DeleteCmd) -> Result<Response> {
    if cmd.kind != EntityKind::Item {
        return Err(VesselError::Constraint("this handler only deletes items".into()));
    }
    let session = conn.session.clone();
    run_in_txn(conn, |txn| {
        let ids = txn.db.resolve_item_ids(&cmd.scope, &cmd.context);
        for id in ids {
            if let Some(item) = txn.db.items.remove(&id) {
                if let Some(gid) = &item.gid {
                    txn.db.gid_index.remove(gid);
                }
                for links in txn.db.links.values_mut() {
                    links.remove(&id);
                }
                txn.notify(
                    Notification::new(NotificationType::Item, Operation::Remove, session.clone())
                        .with_parent(item.parent_id)
                        .with_entity(EntityRef::by_id(id)),
                );
            }
        }
        Ok(())
    })?;
    Ok(Response::Ok)
}

pub fn link(conn: &mut Connection, cmd: LinkCmd, linking: bool) -> Result<Response> {
    let session = conn.session.clone();
    run_in_txn(conn, |txn| {
        let collection = txn.db.collections.get(&cmd.collection_id).ok_or(VesselError::NotFound)?;
        if !collection.virtual_ {
            return Err(VesselError::Constraint("can only link/unlink items in a virtual collection".into()));
        }
        let link_context = ScopeContext {
            collection: Some(IdOrRid::Id(cmd.collection_id)),
            tag: None,
        };
        let ids = txn.db.resolve_item_ids(&cmd.items, &link_context);
        let entry = txn.db.links.entry(cmd.collection_id).or_default();
        for id in &ids {
            if linking {
                entry.insert(*id);
            } else {
                entry.remove(id);
            }
        }
        txn.notify(
            Notification::new(
                NotificationType::Item,
                if linking { Operation::Link } else { Operation::Unlink },
                session.clone(),
            )
            .with_parent(cmd.collection_id),
        );
        Ok(())
    })?;
    Ok(Response::Ok)
}
