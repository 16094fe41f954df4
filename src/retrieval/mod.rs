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

//! Item payload retrieval (§4.5): coalesces concurrent fetches for the
//! same item so a burst of clients asking for the same uncached
//! payload triggers exactly one resource round-trip, and applies a
//! bound on how long it waits for the resource to answer.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::warn;

use crate::agent::ServiceRegistry;
use crate::error::{Result, VesselError};
use crate::model::{FetchScope, Id, Item};

const RETRIEVE_TIMEOUT: Duration = Duration::from_secs(30);

enum Slot {
    InFlight(broadcast::Sender<Result<Item, String>>),
}

/// Coordinates in-flight payload retrievals so concurrent requests for
/// the same `(item, fetch_scope)` share one resource call.
pub struct RetrievalCoordinator {
    registry: Arc<dyn ServiceRegistry>,
    in_flight: DashMap<(Id, String), Slot>,
}

impl RetrievalCoordinator {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        RetrievalCoordinator {
            registry,
            in_flight: DashMap::new(),
        }
    }

    /// Fetch the parts in `fetch_scope` for `item` from its resource,
    /// joining an already in-flight request for the same key rather
    /// than issuing a second one.
    pub async fn retrieve(
        &self,
        resource_name: &str,
        item: &Item,
        fetch_scope: &FetchScope,
    ) -> Result<Item> {
        let key = (item.id, fetch_scope.part_names.join(","));

        let mut rx = None;
        {
            if let Some(slot) = self.in_flight.get(&key) {
                match &*slot {
                    Slot::InFlight(tx) => rx = Some(tx.subscribe()),
                }
            }
        }

        if let Some(mut rx) = rx {
            return match rx.recv().await {
                Ok(Ok(item)) => Ok(item),
                Ok(Err(message)) => Err(VesselError::ResourceUnavailable(message)),
                Err(_) => Err(VesselError::ResourceUnavailable(
                    "retrieval leader dropped without a result".into(),
                )),
            };
        }

        let (tx, _rx) = broadcast::channel(1);
        self.in_flight.insert(key.clone(), Slot::InFlight(tx.clone()));

        let result = self.do_retrieve(resource_name, item, fetch_scope).await;
        self.in_flight.remove(&key);
        let broadcastable = result.as_ref().map(|i| i.clone()).map_err(|e| e.to_string());
        let _ = tx.send(broadcastable);
        result
    }

    async fn do_retrieve(&self, resource_name: &str, item: &Item, fetch_scope: &FetchScope) -> Result<Item> {
        let resource = self.registry.lookup(resource_name).ok_or_else(|| {
            VesselError::ResourceUnavailable(format!("resource '{resource_name}' is not registered"))
        })?;

        match tokio::time::timeout(RETRIEVE_TIMEOUT, resource.retrieve_item(item, fetch_scope)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(resource_name, item_id = item.id, "retrieval timed out");
                Err(VesselError::ResourceUnavailable(format!(
                    "resource '{resource_name}' did not answer within {RETRIEVE_TIMEOUT:?}"
                )))
            }
        }
    }
}
