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

use super::ids::{Id, RemoteId};

/// An unordered typed link between two items. The pair `(left, right,
/// type)` is unique (§3); `left`/`right` are stored in a canonical order
/// (smaller id first) so uniqueness checks don't need to try both
/// orderings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub left_id: Id,
    pub right_id: Id,
    pub relation_type: String,
}

impl RelationKey {
    pub fn new(a: Id, b: Id, relation_type: impl Into<String>) -> Self {
        let (left_id, right_id) = if a <= b { (a, b) } else { (b, a) };
        RelationKey {
            left_id,
            right_id,
            relation_type: relation_type.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub key: RelationKey,
    pub remote_id: Option<RemoteId>,
}
