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

use std::collections::{HashMap, HashSet};

use super::ids::{Gid, Id, RemoteId, RemoteRevision};
use super::part::Part;

/// A leaf entity (mail, contact, event) owned by exactly one non-virtual
/// collection, optionally linked from any number of virtual collections
/// (§3). Links are tracked by the store, not on this struct.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: Id,
    pub parent_id: Id,
    pub mime_type: String,
    pub remote_id: Option<RemoteId>,
    pub remote_revision: Option<RemoteRevision>,
    pub gid: Option<Gid>,
    pub size: u64,
    /// Modification time, seconds since epoch.
    pub mtime: i64,
    /// Last time payload bytes were actually read, seconds since epoch.
    pub atime: i64,
    pub revision: i64,
    pub flags: HashSet<String>,
    pub tags: HashSet<Id>,
    pub parts: HashMap<String, Part>,
    /// Marks the item as locally modified and awaiting upstream replay.
    pub dirty: bool,
}

impl Item {
    /// Authoritative size: the byte length of the payload part if one
    /// exists, otherwise the stored `size` field (§3 invariant).
    pub fn authoritative_size(&self) -> u64 {
        self.parts
            .values()
            .find(|p| super::part::is_payload_part(&p.name))
            .map(|p| p.storage.len())
            .unwrap_or(self.size)
    }

    /// Apply a single committed modification, bumping the revision by
    /// exactly one (§3 invariant, §8 property).
    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }
}
