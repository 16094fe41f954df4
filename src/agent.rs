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

//! The resource-agent boundary (§1, §4.4, §4.5): the traits a resource
//! implementation (mail, contacts, calendar backends) satisfies so the
//! retrieval coordinator and the search engine can call out to it
//! without depending on its concrete transport.
//!
//! No resource agent ships with this core; a real deployment runs
//! agents as separate processes reachable over whatever the
//! `ServiceRegistry` resolves them to (D-Bus in the original, a plain
//! RPC socket here — see `SPEC_FULL.md` §A).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::model::{Collection, FetchScope, Id, Item};

/// What the retrieval coordinator and scheduler need from a resource
/// backing a collection: fault in item payloads it doesn't have
/// cached, and list its collection tree for a full resync.
#[async_trait]
pub trait ResourceInterface: Send + Sync {
    /// Resource-assigned name, used for notification filtering and
    /// lookups through the `ServiceRegistry`.
    fn name(&self) -> &str;

    /// Retrieve (or refresh) the parts named in `fetch_scope` for a
    /// single item, returning the updated item. Called when a fetch
    /// needs bytes the local cache doesn't have.
    async fn retrieve_item(&self, item: &Item, fetch_scope: &FetchScope) -> Result<Item>;

    /// List this resource's full collection tree, for a scheduled or
    /// requested full resync.
    async fn retrieve_collections(&self, parent: Id) -> Result<Vec<Collection>>;

    /// Notify the resource that a local change was committed, so it
    /// can replay it upstream. Fire-and-forget from the core's point
    /// of view; delivery guarantees are the change recorder's job.
    async fn change_committed(&self, item: &Item) -> Result<()>;
}

/// Resolves a resource name to its live `ResourceInterface` handle.
/// Stands in for the original's D-Bus activation/service-watcher: here
/// a resource registers itself (e.g. over the same socket, or by
/// linking in-process) and the registry just tracks who's currently
/// reachable.
pub trait ServiceRegistry: Send + Sync {
    fn lookup(&self, resource_name: &str) -> Option<std::sync::Arc<dyn ResourceInterface>>;
    fn register(&self, resource: std::sync::Arc<dyn ResourceInterface>);
    fn unregister(&self, resource_name: &str);
}

/// A `ServiceRegistry` backed by a concurrent map rather than any
/// cross-process discovery, for resources linked into the same
/// process as the core (or wired up by a test).
#[derive(Default)]
pub struct InProcessRegistry {
    resources: DashMap<String, Arc<dyn ResourceInterface>>,
}

impl InProcessRegistry {
    pub fn new() -> Self {
        InProcessRegistry::default()
    }
}

impl ServiceRegistry for InProcessRegistry {
    fn lookup(&self, resource_name: &str) -> Option<Arc<dyn ResourceInterface>> {
        self.resources.get(resource_name).map(|r| r.clone())
    }

    fn register(&self, resource: Arc<dyn ResourceInterface>) {
        self.resources.insert(resource.name().to_string(), resource);
    }

    fn unregister(&self, resource_name: &str) {
        self.resources.remove(resource_name);
    }
}

/// A pluggable full-text/attribute search backend (§4.4 Search). The
/// core ships no indexer; `search` on an empty registry simply returns
/// no results rather than erroring, since search is explicitly
/// best-effort.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str, mime_types: &[String], collections: &[Id]) -> Result<Vec<Id>>;
}

/// A `SearchEngine` with nothing indexed, used when no real indexer is
/// configured.
pub struct NullSearchEngine;

#[async_trait]
impl SearchEngine for NullSearchEngine {
    async fn search(&self, _query: &str, _mime_types: &[String], _collections: &[Id]) -> Result<Vec<Id>> {
        Ok(Vec::new())
    }
}
