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

use std::time::Duration;

/// Three-valued preference used for per-collection local flags (§6).
/// `Undefined` falls back to the collection's plain `enabled` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate {
    #[default]
    Undefined,
    True,
    False,
}

impl Tristate {
    /// Resolve against a plain boolean fallback.
    pub fn resolve(self, fallback: bool) -> bool {
        match self {
            Tristate::Undefined => fallback,
            Tristate::True => true,
            Tristate::False => false,
        }
    }
}

/// Per-collection synchronization and caching configuration (§3, §4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// If true, the effective policy is inherited from the nearest
    /// ancestor with `inherit = false` instead of using this policy.
    pub inherit: bool,
    pub sync_pref: Tristate,
    pub check_interval_secs: Option<u64>,
    pub cached_parts: Vec<String>,
    pub cache_timeout_secs: Option<u64>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            inherit: true,
            sync_pref: Tristate::Undefined,
            check_interval_secs: None,
            cached_parts: Vec::new(),
            cache_timeout_secs: None,
        }
    }
}

impl CachePolicy {
    /// The interval the scheduler should use, clamped to at least
    /// `minimum`. Falls back to `default_secs` when unset.
    pub fn effective_interval(&self, minimum: Duration, default_secs: u64) -> Duration {
        let secs = self.check_interval_secs.unwrap_or(default_secs);
        Duration::from_secs(secs).max(minimum)
    }
}
