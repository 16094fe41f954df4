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

//! The data model (§3): entities, identifiers, scope selectors, and the
//! tristate/cache-policy types collections use for inheritance.

pub mod cache_policy;
pub mod collection;
pub mod ids;
pub mod item;
pub mod part;
pub mod relation;
pub mod resource;
pub mod scope;
pub mod tag;

pub use cache_policy::{CachePolicy, Tristate};
pub use collection::{Collection, PersistentSearch};
pub use ids::{Gid, Id, RemoteId, RemoteRevision, ROOT_ID};
pub use item::Item;
pub use part::{Part, PartStorage};
pub use relation::{Relation, RelationKey};
pub use resource::Resource;
pub use scope::{AncestorDepth, FetchScope, IdOrRid, Scope, ScopeContext, TagFetchScope};
pub use tag::Tag;
