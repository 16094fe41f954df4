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

//! The collection sync scheduler (§4.8): a binary heap of due checks,
//! keyed by each collection's effective cache-check interval, with
//! inheritance resolved through the store.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::model::Id;
use crate::store::Store;

/// Rescheduling is skipped if the newly computed due time is within
/// this tolerance of the currently scheduled one (§9 Open Questions):
/// avoids a reschedule storm when a cache policy is touched without
/// materially changing its interval.
const RESCHEDULE_EPSILON: Duration = Duration::from_secs(1);

struct Heap {
    entries: BinaryHeap<Reverse<DueCheckKey>>,
}

/// `Instant` has no total order by value identity beyond time, so key
/// the heap on `(due, collection_id)` directly rather than wrapping in
/// another `Reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DueCheckKey(Instant, Id);

impl Heap {
    fn new() -> Self {
        Heap { entries: BinaryHeap::new() }
    }

    fn push(&mut self, due: Instant, collection_id: Id) {
        self.entries.push(Reverse(DueCheckKey(due, collection_id)));
    }

    fn peek_due(&self) -> Option<Instant> {
        self.entries.peek().map(|Reverse(k)| k.0)
    }

    fn pop(&mut self) -> Option<(Instant, Id)> {
        self.entries.pop().map(|Reverse(k)| (k.0, k.1))
    }
}

/// The heap plus the per-collection instant it currently believes is
/// due, kept under one lock so a reschedule can never race a pop. A
/// collection's prior heap entry is never removed from the heap
/// itself — it is left in place and recognised as stale at pop time by
/// comparing against `scheduled`, which is the usual lazy-deletion
/// trick for a `BinaryHeap` that has no O(log n) arbitrary-removal.
struct Inner {
    heap: Heap,
    scheduled: HashMap<Id, Instant>,
}

/// Schedules periodic cache-verification checks per collection. The
/// scheduler does not itself talk to resources; it emits due
/// collection ids on `due_tx` for the retrieval/handler layer to act
/// on, keeping this module free of resource-RPC concerns.
pub struct Scheduler {
    store: Arc<Store>,
    inner: Mutex<Inner>,
    minimum_interval: Duration,
    default_interval_secs: u64,
}

impl Scheduler {
    pub fn new(store: Arc<Store>, minimum_interval: Duration, default_interval_secs: u64) -> Arc<Self> {
        Arc::new(Scheduler {
            store,
            inner: Mutex::new(Inner { heap: Heap::new(), scheduled: HashMap::new() }),
            minimum_interval,
            default_interval_secs,
        })
    }

    fn effective_interval(&self, collection_id: Id) -> Duration {
        match self.store.effective_cache_policy(collection_id) {
            Ok(policy) => policy.effective_interval(self.minimum_interval, self.default_interval_secs),
            Err(_) => Duration::from_secs(self.default_interval_secs),
        }
    }

    /// (Re)schedule a collection's next check. If it is already
    /// scheduled within `RESCHEDULE_EPSILON` of the newly computed due
    /// time, the existing entry is left alone rather than pushing a
    /// duplicate (§4.8, §9 Open Questions); otherwise the collection's
    /// prior due instant is replaced so its old heap entry is treated
    /// as stale.
    pub fn schedule(&self, collection_id: Id) {
        let interval = self.effective_interval(collection_id);
        let due = Instant::now() + interval;
        let mut inner = self.inner.lock();
        if let Some(&existing) = inner.scheduled.get(&collection_id) {
            if existing.saturating_duration_since(due) < RESCHEDULE_EPSILON
                && due.saturating_duration_since(existing) < RESCHEDULE_EPSILON
            {
                trace!(collection_id, "reschedule within epsilon, skipping");
                return;
            }
        }
        inner.scheduled.insert(collection_id, due);
        inner.heap.push(due, collection_id);
    }

    /// Erase a collection's scheduled check (§4.8, §8): any heap entry
    /// already pushed for it is left to be discarded as stale when it
    /// is eventually popped.
    pub fn remove(&self, collection_id: Id) {
        self.inner.lock().scheduled.remove(&collection_id);
    }

    /// Drive the scheduler loop: sleep until the next due check, then
    /// emit it on `due_tx` and immediately reschedule the same
    /// collection for its next interval. A popped entry that no longer
    /// matches `scheduled` (superseded by a reschedule, or erased) is
    /// silently discarded rather than emitted. Runs until `due_tx` is
    /// dropped by every receiver.
    pub async fn run(self: Arc<Self>, due_tx: mpsc::Sender<Id>) {
        loop {
            let next = {
                let inner = self.inner.lock();
                inner.heap.peek_due()
            };
            match next {
                Some(due) => {
                    tokio::time::sleep_until(due).await;
                    let fired = {
                        let mut inner = self.inner.lock();
                        match inner.heap.pop() {
                            Some((popped_due, collection_id)) => {
                                match inner.scheduled.get(&collection_id) {
                                    Some(&scheduled_due) if scheduled_due == popped_due => Some(collection_id),
                                    _ => {
                                        trace!(collection_id, "discarding stale scheduler entry");
                                        None
                                    }
                                }
                            }
                            None => None,
                        }
                    };
                    if let Some(collection_id) = fired {
                        debug!(collection_id, "collection check due");
                        if due_tx.send(collection_id).await.is_err() {
                            return;
                        }
                        self.schedule(collection_id);
                    }
                }
                None => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn schedules_and_emits_a_due_collection() {
        let store = Arc::new(Store::new(PathBuf::from("/tmp"), 4096));
        let scheduler = Scheduler::new(store, Duration::from_millis(10), 1);
        scheduler.schedule(42);
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(scheduler.run(tx));
        let due = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("scheduler should emit within timeout");
        assert_eq!(due, Some(42));
        handle.abort();
    }

    #[tokio::test]
    async fn removing_a_collection_clears_its_entry() {
        let store = Arc::new(Store::new(PathBuf::from("/tmp"), 4096));
        let scheduler = Scheduler::new(store, Duration::from_millis(10), 1);
        scheduler.schedule(7);
        scheduler.remove(7);
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(scheduler.run(tx));
        let result = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(result.is_err(), "a removed collection must not fire");
        handle.abort();
    }

    #[tokio::test]
    async fn rescheduling_replaces_the_stale_entry_instead_of_firing_it_first() {
        let store = Arc::new(Store::new(PathBuf::from("/tmp"), 4096));
        let scheduler = Scheduler::new(store, Duration::from_millis(1), 1);

        {
            // Push a short-lived entry directly so it predates the
            // reschedule below without racing the real clock.
            let mut inner = scheduler.inner.lock();
            let due = Instant::now() + Duration::from_millis(20);
            inner.scheduled.insert(5, due);
            inner.heap.push(due, 5);
        }
        // Reschedule collection 5 much further out; its earlier entry
        // must not be the one that fires.
        {
            let mut inner = scheduler.inner.lock();
            let due = Instant::now() + Duration::from_secs(60);
            inner.scheduled.insert(5, due);
            inner.heap.push(due, 5);
        }
        scheduler.schedule(6);

        let (tx, mut rx) = mpsc::channel(2);
        let handle = tokio::spawn(scheduler.run(tx));
        let due = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("scheduler should emit within timeout");
        assert_eq!(due, Some(6));
        handle.abort();
    }
}
