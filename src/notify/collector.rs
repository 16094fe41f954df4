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

//! Glues a committed transaction's raw notifications to compression and
//! fan-out (§4.6). A connection hands its transaction's notifications
//! to `Collector::emit` on commit; the caller is responsible for also
//! appending the (compressed) result to the change recorder.

use std::sync::Arc;

use super::compress::compress;
use super::fanout::FanoutHub;
use super::types::Notification;

pub struct Collector {
    hub: Arc<FanoutHub>,
}

impl Collector {
    pub fn new(hub: Arc<FanoutHub>) -> Self {
        Collector { hub }
    }

    /// Compress a transaction's notification batch and dispatch it to
    /// every matching subscriber, returning the compressed batch for
    /// the caller to additionally persist.
    pub fn emit(&self, notifications: Vec<Notification>) -> Vec<Notification> {
        if notifications.is_empty() {
            return notifications;
        }
        let compressed = compress(notifications);
        self.hub.dispatch(&compressed);
        compressed
    }
}
