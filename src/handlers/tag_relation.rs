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
use crate::model::{Id, RelationKey, Scope, Tag};
use crate::notify::{EntityRef, Notification, NotificationType, Operation};
use crate::wire::Response;

use super::run_in_txn;

pub fn create_tag(conn: &mut Connection, gid: String, tag_type: String, parent_id: Option<i64>) -> Result<Response> {
    let store = conn.ctx.store.clone();
    let session = conn.session.clone();
    let tag = run_in_txn(conn, |txn| {
        if let Some(parent) = parent_id {
            if !txn.db.tags.contains_key(&parent) {
                return Err(VesselError::NotFound);
            }
        }
        if txn.db.tags.values().any(|t| t.gid == gid) {
            return Err(VesselError::Constraint(format!("tag gid '{gid}' already in use")));
        }
        let id = store.allocate_id();
        let tag = Tag {
            id,
            gid: gid.clone(),
            tag_type: tag_type.clone(),
            remote_id: None,
            parent_id,
            attributes: Default::default(),
        };
        txn.db.tags.insert(id, tag.clone());
        txn.notify(
            Notification::new(NotificationType::Tag, Operation::Add, session.clone())
                .with_entity(EntityRef::by_id(id)),
        );
        Ok(tag)
    })?;
    Ok(Response::Tags(vec![tag]))
}

pub fn fetch_tags(conn: &mut Connection, scope: Scope) -> Result<Response> {
    let tags = conn.ctx.store.read(|db| {
        db.resolve_tag_ids(&scope)
            .into_iter()
            .filter_map(|id| db.tags.get(&id).cloned())
            .collect::<Vec<_>>()
    })?;
    Ok(Response::Tags(tags))
}

pub fn delete_tag(conn: &mut Connection, scope: Scope) -> Result<Response> {
    let session = conn.session.clone();
    run_in_txn(conn, |txn| {
        let ids = txn.db.resolve_tag_ids(&scope);
        for id in ids {
            if txn.db.tags.remove(&id).is_some() {
                for item in txn.db.items.values_mut() {
                    item.tags.remove(&id);
                }
                txn.notify(
                    Notification::new(NotificationType::Tag, Operation::Remove, session.clone())
                        .with_entity(EntityRef::by_id(id)),
                );
            }
        }
        Ok(())
    })?;
    Ok(Response::Ok)
}

pub fn create_relation(conn: &mut Connection, left_id: Id, right_id: Id, relation_type: String) -> Result<Response> {
    let session = conn.session.clone();
    let relation = run_in_txn(conn, |txn| {
        if !txn.db.items.contains_key(&left_id) || !txn.db.items.contains_key(&right_id) {
            return Err(VesselError::NotFound);
        }
        let key = RelationKey::new(left_id, right_id, relation_type.clone());
        if txn.db.relations.contains_key(&key) {
            return Err(VesselError::Constraint("relation already exists".into()));
        }
        let relation = crate::model::Relation { key: key.clone(), remote_id: None };
        txn.db.relations.insert(key, relation.clone());
        txn.notify(
            Notification::new(NotificationType::Relation, Operation::ModifyRelations, session.clone())
                .with_entity(EntityRef::by_id(left_id)),
        );
        Ok(relation)
    })?;
    Ok(Response::Relations(vec![relation]))
}

pub fn fetch_relations(conn: &mut Connection, item_id: Id, relation_type: Option<String>) -> Result<Response> {
    let relations = conn.ctx.store.read(|db| {
        db.relations
            .values()
            .filter(|r| {
                (r.key.left_id == item_id || r.key.right_id == item_id)
                    && relation_type.as_deref().map(|t| t == r.key.relation_type).unwrap_or(true)
            })
            .cloned()
            .collect::<Vec<_>>()
    })?;
    Ok(Response::Relations(relations))
}

pub fn delete_relation(conn: &mut Connection, left_id: Id, right_id: Id, relation_type: String) -> Result<Response> {
    let session = conn.session.clone();
    run_in_txn(conn, |txn| {
        let key = RelationKey::new(left_id, right_id, relation_type.clone());
        if txn.db.relations.remove(&key).is_some() {
            txn.notify(
                Notification::new(NotificationType::Relation, Operation::ModifyRelations, session.clone())
                    .with_entity(EntityRef::by_id(left_id)),
            );
        }
        Ok(())
    })?;
    Ok(Response::Ok)
}
