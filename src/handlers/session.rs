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

use crate::connection::{Connection, SessionState};
use crate::error::{Result, VesselError};
use crate::wire::Response;

const PROTOCOL_VERSION: i32 = 1;

pub fn hello() -> Result<Response> {
    Ok(Response::HelloAck { protocol_version: PROTOCOL_VERSION })
}

pub fn login(conn: &mut Connection, session_id: String) -> Result<Response> {
    if conn.state != SessionState::NonAuthenticated {
        return Err(VesselError::Protocol("login issued twice on the same connection".into()));
    }
    conn.session = session_id;
    conn.state = SessionState::Authenticated;
    Ok(Response::LoginAck)
}

pub fn logout(conn: &mut Connection) -> Result<Response> {
    conn.rollback_transaction();
    conn.state = SessionState::LoggingOut;
    Ok(Response::Ok)
}

pub fn transaction_begin(conn: &mut Connection) -> Result<Response> {
    if conn.txn.is_some() {
        return Err(VesselError::Protocol("a transaction is already open on this connection".into()));
    }
    conn.txn = Some(conn.ctx.store.begin()?);
    Ok(Response::Ok)
}

pub fn transaction_commit(conn: &mut Connection) -> Result<Response> {
    conn.commit_transaction()?;
    Ok(Response::Ok)
}

pub fn transaction_rollback(conn: &mut Connection) -> Result<Response> {
    conn.rollback_transaction();
    Ok(Response::Ok)
}
