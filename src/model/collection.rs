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

use std::collections::HashMap;

use super::cache_policy::{CachePolicy, Tristate};
use super::ids::{Id, RemoteId, RemoteRevision, ROOT_ID};

/// A persisted search: a query plus the collections it draws items from.
/// Membership is recomputed by the search engine, not stored directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistentSearch {
    pub query: String,
    pub source_collections: Vec<Id>,
    pub remote_search: bool,
    pub recursive: bool,
}

/// A node in a per-resource collection tree (§3).
#[derive(Debug, Clone)]
pub struct Collection {
    pub id: Id,
    pub parent_id: Id,
    pub name: String,
    pub mime_types: Vec<String>,
    pub resource_id: Id,
    pub cache_policy: CachePolicy,
    pub attributes: HashMap<String, Vec<u8>>,
    pub enabled: bool,
    pub sync_pref: Tristate,
    pub display_pref: Tristate,
    pub index_pref: Tristate,
    pub virtual_: bool,
    pub referenced: bool,
    pub persistent_search: Option<PersistentSearch>,
    pub remote_id: Option<RemoteId>,
    pub remote_revision: Option<RemoteRevision>,
}

impl Collection {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_ID
    }

    /// Whether this collection is eligible for scheduled syncing,
    /// resolving `sync_pref` against `enabled` per §6.
    pub fn sync_eligible(&self) -> bool {
        self.sync_pref.resolve(self.enabled)
    }
}
