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

//! Command dispatch (§4.4): one function per command kind, sharing the
//! transaction-or-autocommit plumbing in this module.

mod collection;
mod item;
mod search;
mod session;
mod subscription;
mod tag_relation;

use crate::connection::{error_response, Connection};
use crate::error::Result;
use crate::store::{with_deadlock_retry, Transaction};
use crate::wire::{Command, Response};

/// Run `f` against the connection's currently open transaction if one
/// exists, or auto-commit a fresh one around it otherwise. An
/// autocommit acquisition is retried per `with_deadlock_retry`; a
/// command inside an explicit transaction never re-runs `f`, since the
/// transaction's snapshot was already taken and doesn't need
/// re-acquiring a lock.
fn run_in_txn<T>(conn: &mut Connection, f: impl Fn(&mut Transaction) -> Result<T>) -> Result<T> {
    if let Some(txn) = conn.txn.as_mut() {
        return f(txn);
    }
    let store = conn.ctx.store.clone();
    let (result, notifications) = with_deadlock_retry(|| {
        let mut txn = store.begin()?;
        let result = f(&mut txn)?;
        let notifications = txn.commit();
        Ok((result, notifications))
    })?;
    let compressed = conn.ctx.collector.emit(notifications);
    conn.ctx.recorder.append(&compressed)?;
    Ok(result)
}

pub async fn dispatch(conn: &mut Connection, command: Command) -> Response {
    let result = dispatch_inner(conn, command).await;
    match result {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn dispatch_inner(conn: &mut Connection, command: Command) -> Result<Response> {
    use crate::connection::SessionState;

    match command {
        Command::Hello => session::hello(),
        Command::Login { session_id } => session::login(conn, session_id),
        Command::Logout => session::logout(conn),

        Command::TransactionBegin => session::transaction_begin(conn),
        Command::TransactionCommit => session::transaction_commit(conn),
        Command::TransactionRollback => session::transaction_rollback(conn),

        _ if conn.state != SessionState::Authenticated => Err(crate::error::VesselError::Protocol(
            "command issued before authentication".into(),
        )),

        Command::CreateItem(cmd) => item::create(conn, cmd),
        Command::FetchItems { scope, context, fetch_scope } => {
            item::fetch(conn, scope, context, fetch_scope).await
        }
        Command::ModifyItem { scope, context, fields } => item::modify(conn, scope, context, fields),
        Command::Move(cmd) => item::move_or_copy(conn, cmd, false),
        Command::Copy(cmd) => item::move_or_copy(conn, cmd, true),
        Command::Delete(cmd) => item::delete(conn, cmd),
        Command::Link(cmd) => item::link(conn, cmd, true),
        Command::Unlink(cmd) => item::link(conn, cmd, false),

        Command::CreateCollection(cmd) => collection::create(conn, cmd),
        Command::FetchCollections { scope, context } => collection::fetch(conn, scope, context),
        Command::ModifyCollection(cmd) => collection::modify(conn, cmd),

        Command::CreateTag { gid, tag_type, parent_id } => tag_relation::create_tag(conn, gid, tag_type, parent_id),
        Command::FetchTags { scope } => tag_relation::fetch_tags(conn, scope),
        Command::DeleteTag { scope } => tag_relation::delete_tag(conn, scope),
        Command::CreateRelation { left_id, right_id, relation_type } => {
            tag_relation::create_relation(conn, left_id, right_id, relation_type)
        }
        Command::FetchRelations { item_id, relation_type } => {
            tag_relation::fetch_relations(conn, item_id, relation_type)
        }
        Command::DeleteRelation { left_id, right_id, relation_type } => {
            tag_relation::delete_relation(conn, left_id, right_id, relation_type)
        }

        Command::Search(cmd) => search::search(conn, cmd).await,
        Command::StoreSearch { name, search: cmd } => search::store_search(conn, name, cmd),

        Command::CreateSubscription { subscriber_name, session } => {
            subscription::create(conn, subscriber_name, session)
        }
        Command::ModifySubscription(delta) => subscription::modify(conn, delta),

        Command::StreamPayload { .. } => Err(crate::error::VesselError::Protocol(
            // TODO: correlate with the originating Create/Modify tag once
            // large-payload continuation framing is added; today every
            // payload travels inline in the command body.
            "standalone payload streaming is not yet wired to a pending fetch".into(),
        )),
    }
}
