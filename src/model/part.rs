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

//! Named attributes of an item. `PLD:` parts carry payload bytes, `ATR:`
//! parts carry metadata; both share the same storage/versioning model.

pub const PAYLOAD_PREFIX: &str = "PLD:";
pub const ATTRIBUTE_PREFIX: &str = "ATR:";

/// Well-known full-payload part name used by `fetchFullPayload`.
pub const PART_RFC822: &str = "PLD:RFC822";

pub fn is_payload_part(name: &str) -> bool {
    name.starts_with(PAYLOAD_PREFIX)
}

/// Where a part's bytes physically live. The choice is a function of
/// size and a configured threshold (§3); the variant is what callers
/// need to know, not the threshold itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartStorage {
    /// Bytes held inline in the store.
    Inline(Vec<u8>),
    /// Bytes held in a content-addressed external file; the store keeps
    /// only the filename.
    External { file_name: String, size: u64 },
}

impl PartStorage {
    pub fn len(&self) -> u64 {
        match self {
            PartStorage::Inline(b) => b.len() as u64,
            PartStorage::External { size, .. } => *size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named blob attached to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub storage: PartStorage,
    /// Bumped by the resource to invalidate a stale local copy.
    pub version: u32,
}

impl Part {
    pub fn new_inline(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Part {
            name: name.into(),
            storage: PartStorage::Inline(bytes),
            version: 0,
        }
    }

    pub fn is_cached(&self) -> bool {
        match &self.storage {
            PartStorage::Inline(b) => !b.is_empty(),
            PartStorage::External { .. } => true,
        }
    }
}

/// Decide inline vs. external storage for a part's bytes given the
/// server's configured size threshold.
pub fn choose_storage(bytes: Vec<u8>, threshold: u64, allocate_external: impl FnOnce(&[u8]) -> String) -> PartStorage {
    if bytes.len() as u64 >= threshold {
        let size = bytes.len() as u64;
        let file_name = allocate_external(&bytes);
        PartStorage::External { file_name, size }
    } else {
        PartStorage::Inline(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_bytes_under_threshold_inline() {
        let storage = choose_storage(vec![1, 2, 3], 10, |_| panic!("should not allocate"));
        assert_eq!(storage, PartStorage::Inline(vec![1, 2, 3]));
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn stores_bytes_at_or_above_threshold_externally() {
        let storage = choose_storage(vec![0u8; 10], 10, |_| "42_0".to_string());
        assert_eq!(
            storage,
            PartStorage::External { file_name: "42_0".to_string(), size: 10 }
        );
    }

    #[test]
    fn external_part_is_always_considered_cached() {
        let part = Part {
            name: "PLD:RFC822".into(),
            storage: PartStorage::External { file_name: "1_0".into(), size: 4096 },
            version: 0,
        };
        assert!(part.is_cached());
    }

    #[test]
    fn empty_inline_part_is_not_cached() {
        let part = Part::new_inline("PLD:RFC822", Vec::new());
        assert!(!part.is_cached());
    }

    #[test]
    fn recognises_payload_part_names() {
        assert!(is_payload_part(PART_RFC822));
        assert!(!is_payload_part("ATR:flags"));
    }
}
