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

//! Scope selectors (§6): the ways a command can address a set of entities.

use super::ids::{Gid, Id, RemoteId};

/// Selects a set of entities by one of four addressing schemes. Exactly
/// one variant applies per command; `Rid`/`HierarchicalRid`/`Gid` scopes
/// additionally need a `ScopeContext` to disambiguate which resource or
/// collection they're relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Direct addressing by server-assigned identifier.
    Uid(Vec<Id>),
    /// Addressing by resource-assigned remote id.
    Rid(Vec<RemoteId>),
    /// A path of remote ids from a root, innermost last.
    HierarchicalRid(Vec<RemoteId>),
    /// Cross-resource correlation key.
    Gid(Vec<Gid>),
}

impl Scope {
    pub fn uid(id: Id) -> Self {
        Scope::Uid(vec![id])
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Scope::Uid(v) => v.is_empty(),
            Scope::Rid(v) => v.is_empty(),
            Scope::HierarchicalRid(v) => v.is_empty(),
            Scope::Gid(v) => v.is_empty(),
        }
    }

    /// Whether resolving this scope requires a `ScopeContext` (a
    /// collection and/or resource to disambiguate remote ids, which are
    /// only unique within their owning resource).
    pub fn needs_context(&self) -> bool {
        !matches!(self, Scope::Uid(_))
    }
}

/// One half of a scope context reference: either a direct id or a remote
/// id resolved against the context's resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrRid {
    Id(Id),
    Rid(RemoteId),
}

/// Disambiguates `Rid`/`Gid` scopes by naming the collection and/or tag
/// they're relative to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    pub collection: Option<IdOrRid>,
    pub tag: Option<IdOrRid>,
}

/// How far up the ancestor chain a fetch should attach parent collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncestorDepth {
    None,
    Parent,
    All,
}

/// Which parts and auxiliary data a Fetch should assemble (§4.4).
#[derive(Debug, Clone)]
pub struct FetchScope {
    pub part_names: Vec<String>,
    pub full_payload: bool,
    pub ancestor_depth: AncestorDepth,
    pub cache_only: bool,
    pub ignore_errors: bool,
    pub check_cached_payload_parts_only: bool,
    pub changed_since: Option<i64>,
    /// Treat the request as originating from a trusted indexer session,
    /// which is allowed to fault in payloads even when the resource has
    /// no local storage of its own (§4.4).
    pub trusted_indexer: bool,
}

impl Default for FetchScope {
    fn default() -> Self {
        FetchScope {
            part_names: Vec::new(),
            full_payload: false,
            ancestor_depth: AncestorDepth::None,
            cache_only: false,
            ignore_errors: false,
            check_cached_payload_parts_only: false,
            changed_since: None,
            trusted_indexer: false,
        }
    }
}

impl FetchScope {
    /// Whether bytes returned by this fetch should bump the item's
    /// atime. Kept as the legacy heuristic (§9 Open Questions): only a
    /// full-payload fetch counts, not an individual named-part fetch.
    pub fn bumps_atime(&self) -> bool {
        self.full_payload
    }
}

/// Which tags to attach to fetched items, mirroring `FetchScope` but for
/// the tag axis.
#[derive(Debug, Clone, Default)]
pub struct TagFetchScope {
    pub fetch_id_only: bool,
}
