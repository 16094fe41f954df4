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

use crate::connection::Connection;
use crate::error::{Result, VesselError};
use crate::model::{CachePolicy, Collection, Resource, Scope, ScopeContext, Tristate, ROOT_ID};
use crate::notify::{EntityRef, Notification, NotificationType, Operation};
use crate::wire::command::{CreateCollectionCmd, ModifyCollectionCmd};
use crate::wire::Response;

use super::run_in_txn;

/// Find a resource by name, registering a fresh one if this is the
/// first collection created under it.
fn find_or_create_resource(txn: &mut crate::store::Transaction, name: &str, allocate_id: impl FnOnce() -> crate::model::Id) -> crate::model::Id {
    if let Some(existing) = txn.db.resources.values().find(|r| r.name == name) {
        return existing.id;
    }
    let id = allocate_id();
    txn.db.resources.insert(
        id,
        Resource {
            id,
            name: name.to_string(),
            session_id: None,
        },
    );
    id
}

pub fn create(conn: &mut Connection, cmd: CreateCollectionCmd) -> Result<Response> {
    let store = conn.ctx.store.clone();
    let session = conn.session.clone();
    let collection = run_in_txn(conn, |txn| {
        if cmd.parent_id != ROOT_ID && !txn.db.collections.contains_key(&cmd.parent_id) {
            return Err(VesselError::NotFound);
        }
        let resource_id = find_or_create_resource(txn, &cmd.resource, || store.allocate_id());
        let id = store.allocate_id();
        let collection = Collection {
            id,
            parent_id: cmd.parent_id,
            name: cmd.name.clone(),
            mime_types: cmd.mime_types.clone(),
            resource_id,
            cache_policy: CachePolicy::default(),
            attributes: Default::default(),
            enabled: true,
            sync_pref: Tristate::Undefined,
            display_pref: Tristate::Undefined,
            index_pref: Tristate::Undefined,
            virtual_: cmd.virtual_,
            referenced: false,
            persistent_search: None,
            remote_id: cmd.remote_id.clone(),
            remote_revision: None,
        };
        txn.db.collections.insert(id, collection.clone());
        txn.notify(
            Notification::new(NotificationType::Collection, Operation::Add, session.clone())
                .with_parent(cmd.parent_id)
                .with_entity(EntityRef {
                    id,
                    remote_id: cmd.remote_id.clone(),
                    remote_revision: None,
                    mime_type: None,
                }),
        );
        Ok(collection)
    })?;
    Ok(Response::Collections(vec![collection]))
}

pub fn fetch(conn: &mut Connection, scope: Scope, context: ScopeContext) -> Result<Response> {
    let collections = conn.ctx.store.read(|db| {
        db.resolve_collection_ids(&scope, &context)
            .into_iter()
            .filter_map(|id| db.collections.get(&id).cloned())
            .collect::<Vec<_>>()
    })?;
    Ok(Response::Collections(collections))
}

pub fn modify(conn: &mut Connection, cmd: ModifyCollectionCmd) -> Result<Response> {
    let session = conn.session.clone();
    let collection = run_in_txn(conn, |txn| {
        if let Some(new_parent) = cmd.parent_id {
            if !txn.db.collections.contains_key(&new_parent) && new_parent != ROOT_ID {
                return Err(VesselError::NotFound);
            }
            if txn.db.is_ancestor_or_self(cmd.id, new_parent) {
                return Err(VesselError::Constraint("move would create a collection cycle".into()));
            }
        }

        let old_parent = txn.db.collections.get(&cmd.id).ok_or(VesselError::NotFound)?.parent_id;

        {
            let collection = txn.db.collections.get_mut(&cmd.id).ok_or(VesselError::NotFound)?;
            if let Some(name) = &cmd.name {
                collection.name = name.clone();
            }
            if let Some(new_parent) = cmd.parent_id {
                collection.parent_id = new_parent;
            }
            if let Some(remote_id) = &cmd.remote_id {
                collection.remote_id = Some(remote_id.clone());
            }
            if let Some(remote_revision) = &cmd.remote_revision {
                collection.remote_revision = Some(remote_revision.clone());
            }
            if let Some(mime_types) = &cmd.mime_types {
                collection.mime_types = mime_types.clone();
            }
            if let Some(enabled) = cmd.enabled {
                collection.enabled = enabled;
            }
            if let Some(sync_pref) = cmd.sync_pref {
                collection.sync_pref = sync_pref;
            }
            if let Some(display_pref) = cmd.display_pref {
                collection.display_pref = display_pref;
            }
            if let Some(index_pref) = cmd.index_pref {
                collection.index_pref = index_pref;
            }
            if let Some(cache_policy) = &cmd.cache_policy {
                collection.cache_policy = cache_policy.clone();
            }
            if let Some(persistent_search) = &cmd.persistent_search {
                collection.persistent_search = Some(persistent_search.clone());
            }
            for name in &cmd.removed_attributes {
                collection.attributes.remove(name);
            }
            for (key, value) in &cmd.attributes {
                collection.attributes.insert(key.clone(), value.clone());
            }
            if let Some(referenced) = cmd.referenced {
                collection.referenced = referenced;
            }
        }

        let collection = txn.db.collections.get(&cmd.id).cloned().ok_or(VesselError::NotFound)?;

        let operation = if cmd.parent_id.is_some() { Operation::Move } else { Operation::Modify };
        let mut notif = Notification::new(NotificationType::Collection, operation, session.clone())
            .with_parent(old_parent)
            .with_entity(EntityRef {
                id: collection.id,
                remote_id: collection.remote_id.clone(),
                remote_revision: None,
                mime_type: None,
            });
        if let Some(new_parent) = cmd.parent_id {
            notif = notif.with_parent_dest(new_parent);
        }
        txn.notify(notif);

        Ok(collection)
    })?;
    if cmd.cache_policy.is_some() {
        conn.ctx.scheduler.schedule(collection.id);
    }
    Ok(Response::Collections(vec![collection]))
}
