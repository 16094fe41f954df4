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

//! Per-connection state machine (§4.3): `NonAuthenticated -> Authenticated
//! -> LoggingOut`, one frame loop per TCP connection, an idle-close
//! timer, and the deadlock-retry wrapper around each command.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{info, warn};

use crate::agent::{SearchEngine, ServiceRegistry};
use crate::error::VesselError;
use crate::notify::{Collector, FanoutHub, Notification};
use crate::recorder::ChangeRecorder;
use crate::retrieval::RetrievalCoordinator;
use crate::scheduler::Scheduler;
use crate::store::{Store, Transaction};
use crate::wire::{RequestCodec, RequestFrame, Response, ResponseFrame};

use crate::handlers;

/// How long a connection may sit with no frame from the peer before it
/// is closed from this side (§4.3).
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NonAuthenticated,
    Authenticated,
    LoggingOut,
}

static NEXT_SESSION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Shared, long-lived server context every connection is handed a
/// clone of.
#[derive(Clone)]
pub struct ServerContext {
    pub store: Arc<Store>,
    pub collector: Arc<Collector>,
    pub fanout: Arc<FanoutHub>,
    pub recorder: Arc<ChangeRecorder>,
    pub scheduler: Arc<Scheduler>,
    pub registry: Arc<dyn ServiceRegistry>,
    pub retrieval: Arc<RetrievalCoordinator>,
    pub search: Arc<dyn SearchEngine>,
    pub idle_timeout: Duration,
}

/// All per-connection mutable state, passed by unique reference into
/// each handler so handlers don't need to know about framing or the
/// socket.
pub struct Connection {
    pub ctx: ServerContext,
    pub session: String,
    pub state: SessionState,
    pub txn: Option<Transaction>,
    pub notify_rx: Option<mpsc::Receiver<Notification>>,
    pub subscriber_name: Option<String>,
}

impl Connection {
    pub fn new(ctx: ServerContext) -> Self {
        let seq = NEXT_SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        Connection {
            ctx,
            session: format!("session-{seq}"),
            state: SessionState::NonAuthenticated,
            txn: None,
            notify_rx: None,
            subscriber_name: None,
        }
    }

    /// Commit any open transaction, compress and fan out its
    /// notifications, and append the compressed batch to the change
    /// recorder for resources that were offline.
    pub fn commit_transaction(&mut self) -> crate::error::Result<()> {
        if let Some(txn) = self.txn.take() {
            let raw = txn.commit();
            let compressed = self.ctx.collector.emit(raw);
            self.ctx.recorder.append(&compressed)?;
        }
        Ok(())
    }

    pub fn rollback_transaction(&mut self) {
        if let Some(txn) = self.txn.take() {
            txn.rollback();
        }
    }
}

/// Drive a single accepted TCP connection until the peer disconnects,
/// the idle timeout fires, or a protocol error forces a close.
pub async fn handle(stream: TcpStream, ctx: ServerContext) {
    let idle_timeout = ctx.idle_timeout;
    let mut conn = Connection::new(ctx);
    let mut framed = Framed::new(stream, RequestCodec);
    info!(session = %conn.session, "connection accepted");

    loop {
        let notify_next = async {
            match &mut conn.notify_rx {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            frame = tokio::time::timeout(idle_timeout, framed.next()) => {
                let Ok(frame) = frame else {
                    info!(session = %conn.session, "closing idle connection");
                    break;
                };
                match frame {
                    Some(Ok(request)) => {
                        if !process_frame(&mut conn, &mut framed, request).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session = %conn.session, error = %e, "protocol error, closing connection");
                        break;
                    }
                    None => break,
                }
            }
            notification = notify_next => {
                if let Some(n) = notification {
                    let frame = ResponseFrame { tag: -1, response: Response::Notification(n) };
                    if framed.send(frame).await.is_err() {
                        break;
                    }
                }
            }
        }

        if conn.state == SessionState::LoggingOut {
            break;
        }
    }

    conn.rollback_transaction();
    if let Some(name) = &conn.subscriber_name {
        conn.ctx.fanout.unsubscribe(name);
    }
    info!(session = %conn.session, "connection closed");
}

/// Handle one request frame, applying the deadlock-retry policy (§4.3,
/// §7) around the handler dispatch. Returns `false` when the
/// connection should close after this frame.
async fn process_frame(
    conn: &mut Connection,
    framed: &mut Framed<TcpStream, RequestCodec>,
    request: RequestFrame,
) -> bool {
    let tag = request.tag;
    let response = handlers::dispatch(conn, request.command).await;

    let terminal = matches!(&response, Response::Error { terminal: true, .. });
    if framed.send(ResponseFrame { tag, response }).await.is_err() {
        return false;
    }
    !terminal
}

/// Map a dispatch error onto a response, classifying protocol errors
/// as connection-terminal per §7.
pub fn error_response(err: VesselError) -> Response {
    let terminal = err.is_terminal();
    Response::Error { message: err.to_string(), terminal }
}
