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

//! The data model & store façade (§4.1): a transactional API over the
//! in-memory arena of `memory::Db`, with row-level locking emulated by a
//! lock-with-timeout over the whole arena (the core has a single
//! writer; see spec Non-goals) and a bounded retry wrapper that maps a
//! lock-acquisition timeout onto the same retryable-error path a real
//! deadlock signal would take.

pub mod memory;

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Result, VesselError};
use crate::model::{CachePolicy, Id};
use crate::notify::types::Notification;

pub use memory::Db;

/// How long a transaction waits to acquire the store lock before
/// reporting a retryable (deadlock-shaped) error.
const LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// How many times `with_deadlock_retry` re-invokes a handler before
/// surfacing a generic failure (§4.3, §7).
pub const MAX_DEADLOCK_RETRIES: u32 = 3;

/// The shared store façade. Cheap to clone (an `Arc` internally via
/// `Mutex` ownership is not needed since `Store` itself is held behind
/// an `Arc` by callers); holds the single arena plus id/file allocation
/// counters.
pub struct Store {
    db: Mutex<Db>,
    next_id: AtomicI64,
    next_file_id: AtomicI64,
    payload_dir: PathBuf,
    pub external_threshold: u64,
}

impl Store {
    pub fn new(payload_dir: PathBuf, external_threshold: u64) -> Self {
        Store {
            db: Mutex::new(Db::default()),
            next_id: AtomicI64::new(1),
            next_file_id: AtomicI64::new(1),
            payload_dir,
            external_threshold,
        }
    }

    pub fn allocate_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate a content-addressed external payload file name (§6):
    /// a monotonically allocated id suffixed with a version.
    pub fn allocate_external_file_name(&self, version: u32) -> String {
        let file_id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        format!("{file_id}_{version}")
    }

    pub fn payload_dir(&self) -> &PathBuf {
        &self.payload_dir
    }

    /// Begin a transaction by snapshotting the arena. Blocks (up to
    /// `LOCK_TIMEOUT`) for the store-wide write lock; see module docs
    /// for why this stands in for row-level locking.
    ///
    /// Takes `Arc<Store>` rather than `&self` so the returned
    /// `Transaction` can outlive the borrow that created it — a
    /// connection holds at most one open transaction across several
    /// awaited command handlers, which a borrowed lifetime can't
    /// express cleanly.
    pub fn begin(self: &Arc<Self>) -> Result<Transaction> {
        let guard = self
            .db
            .try_lock_for(LOCK_TIMEOUT)
            .ok_or_else(|| VesselError::Retryable("store lock timed out".into()))?;
        let snapshot = guard.clone();
        drop(guard);
        Ok(Transaction {
            store: Arc::clone(self),
            db: snapshot,
            notifications: Vec::new(),
        })
    }

    /// Run a read-only closure against a momentary snapshot without
    /// going through transaction commit bookkeeping.
    pub fn read<R>(&self, f: impl FnOnce(&Db) -> R) -> Result<R> {
        let guard = self
            .db
            .try_lock_for(LOCK_TIMEOUT)
            .ok_or_else(|| VesselError::Retryable("store lock timed out".into()))?;
        Ok(f(&guard))
    }

    pub fn effective_cache_policy(&self, collection_id: Id) -> Result<CachePolicy> {
        self.read(|db| db.effective_cache_policy(collection_id))
    }

    fn commit(&self, txn: Transaction) -> Vec<Notification> {
        let mut guard = self.db.lock();
        *guard = txn.db;
        txn.notifications
    }
}

/// A connection's open transaction (§4.3): owns a private snapshot of
/// the arena until `commit` swaps it back in, or `rollback` discards
/// it. Nesting is not supported — a connection holds at most one.
pub struct Transaction {
    store: Arc<Store>,
    pub db: Db,
    notifications: Vec<Notification>,
}

impl Transaction {
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Commit the transaction, returning the notifications collected
    /// during it for the caller to compress and fan out (§4.6).
    pub fn commit(self) -> Vec<Notification> {
        self.store.commit(self)
    }

    /// Discard all mutations and collected notifications (§4.4
    /// Transaction, §7 recovery policy).
    pub fn rollback(self) {
        drop(self);
    }
}

/// Retry `f` up to `MAX_DEADLOCK_RETRIES` times while it returns a
/// retryable error, mirroring the connection's `dbDeadlockCatcher`
/// (§4.3). Surfaces `RetryExhausted` once retries are spent.
pub fn with_deadlock_retry<T>(mut f: impl FnMut() -> Result<T>) -> Result<T> {
    let mut last_err = None;
    for _ in 0..=MAX_DEADLOCK_RETRIES {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() => last_err = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(VesselError::RetryExhausted {
        retries: MAX_DEADLOCK_RETRIES,
        source: Box::new(last_err.unwrap_or(VesselError::Retryable("exhausted".into()))),
    })
}
