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

//! Server bootstrap: wires the store, notification fan-out, change
//! recorder, and scheduler into a `ServerContext`, then accepts TCP
//! connections and spawns a `connection::handle` task per socket.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::agent::{InProcessRegistry, NullSearchEngine};
use crate::config::ServerConfig;
use crate::connection::{self, ServerContext};
use crate::error::Result;
use crate::notify::{Collector, FanoutHub};
use crate::recorder::ChangeRecorder;
use crate::retrieval::RetrievalCoordinator;
use crate::scheduler::Scheduler;
use crate::store::Store;

/// Build the long-lived, shared `ServerContext` from a loaded config.
/// Split out from `run` so tests and `vessel-ctl` helpers can stand up
/// the same context without binding a socket.
pub fn build_context(config: &ServerConfig) -> Result<ServerContext> {
    std::fs::create_dir_all(&config.payload_dir)
        .map_err(|e| crate::error::VesselError::Protocol(format!("creating payload dir: {e}")))?;

    let store = Arc::new(Store::new(config.payload_dir.clone(), config.external_payload_threshold));
    let fanout = Arc::new(FanoutHub::new());
    let collector = Arc::new(Collector::new(fanout.clone()));
    let recorder = Arc::new(ChangeRecorder::open(&config.recorder_path)?);
    let registry = Arc::new(InProcessRegistry::new());
    let retrieval = Arc::new(RetrievalCoordinator::new(registry.clone()));
    let scheduler = Scheduler::new(
        store.clone(),
        config.scheduler_minimum_interval,
        config.scheduler_default_interval_secs,
    );

    Ok(ServerContext {
        store,
        collector,
        fanout,
        recorder,
        scheduler,
        registry,
        retrieval,
        search: Arc::new(NullSearchEngine),
        idle_timeout: config.idle_timeout,
    })
}

/// Drive the scheduler's due-check loop, logging collection ids as
/// they come due. A real deployment would hand these off to the
/// resource agent behind each collection; this core has none wired in
/// by default, so it just observes the schedule.
async fn run_scheduler(scheduler: Arc<Scheduler>) {
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(scheduler.run(tx));
    while let Some(collection_id) = rx.recv().await {
        info!(collection_id, "cache check due");
    }
}

/// Bind `config.socket_path`'s equivalent TCP address and accept
/// connections until the process receives a shutdown signal. The
/// original runs over a Unix domain socket; this core speaks the same
/// framed protocol over TCP so it has an address any client library
/// can reach (see `SPEC_FULL.md` §A).
pub async fn run(config: ServerConfig, addr: &str) -> Result<()> {
    let ctx = build_context(&config)?;
    tokio::spawn(run_scheduler(ctx.scheduler.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| crate::error::VesselError::Protocol(format!("binding {addr}: {e}")))?;
    info!(addr, "server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "accepted connection");
                        let ctx = ctx.clone();
                        tokio::spawn(connection::handle(stream, ctx));
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}
