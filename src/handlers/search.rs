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

//! Search (§4.4): a best-effort query against the configured indexer,
//! and a persistent variant that parks the query as a virtual
//! collection so its membership can be recomputed on demand.

use crate::connection::Connection;
use crate::error::Result;
use crate::model::{CachePolicy, Collection, PersistentSearch, Tristate, ROOT_ID};
use crate::notify::{EntityRef, Notification, NotificationType, Operation};
use crate::wire::command::SearchCmd;
use crate::wire::Response;

use super::run_in_txn;

pub async fn search(conn: &mut Connection, cmd: SearchCmd) -> Result<Response> {
    let ids = conn.ctx.search.search(&cmd.query, &cmd.mime_types, &cmd.collections).await?;
    Ok(Response::SearchResult(ids))
}

/// Store a search as a virtual collection under the root so it shows
/// up in a client's collection tree like any other folder. Membership
/// is not materialized here; a fetch against it re-runs the query.
pub fn store_search(conn: &mut Connection, name: String, cmd: SearchCmd) -> Result<Response> {
    let store = conn.ctx.store.clone();
    let session = conn.session.clone();
    let collection = run_in_txn(conn, |txn| {
        let resource_id = match txn.db.resources.values().find(|r| r.name == "search") {
            Some(r) => r.id,
            None => {
                let id = store.allocate_id();
                txn.db.resources.insert(
                    id,
                    crate::model::Resource {
                        id,
                        name: "search".into(),
                        session_id: None,
                    },
                );
                id
            }
        };
        let id = store.allocate_id();
        let collection = Collection {
            id,
            parent_id: ROOT_ID,
            name: name.clone(),
            mime_types: cmd.mime_types.clone(),
            resource_id,
            cache_policy: CachePolicy::default(),
            attributes: Default::default(),
            enabled: true,
            sync_pref: Tristate::Undefined,
            display_pref: Tristate::Undefined,
            index_pref: Tristate::Undefined,
            virtual_: true,
            referenced: false,
            persistent_search: Some(PersistentSearch {
                query: cmd.query.clone(),
                source_collections: cmd.collections.clone(),
                remote_search: false,
                recursive: true,
            }),
            remote_id: None,
            remote_revision: None,
        };
        txn.db.collections.insert(id, collection.clone());
        txn.notify(
            Notification::new(NotificationType::Collection, Operation::Add, session.clone())
                .with_parent(ROOT_ID)
                .with_entity(EntityRef::by_id(id)),
        );
        Ok(collection)
    })?;

    Ok(Response::Collections(vec![collection]))
}
