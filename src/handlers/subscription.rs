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

//! Subscription management (§4.7): wires a connection's notification
//! channel to the fan-out hub and applies incremental filter deltas.

use crate::connection::Connection;
use crate::error::Result;
use crate::notify::SubscriberInterest;
use crate::wire::command::SubscriptionDelta;
use crate::wire::Response;

pub fn create(conn: &mut Connection, subscriber_name: String, session: String) -> Result<Response> {
    let interest = SubscriberInterest {
        session: session.clone(),
        ..Default::default()
    };
    let rx = conn.ctx.fanout.subscribe(subscriber_name.clone(), interest);
    conn.notify_rx = Some(rx);
    conn.subscriber_name = Some(subscriber_name);
    Ok(Response::Ok)
}

pub fn modify(conn: &mut Connection, delta: SubscriptionDelta) -> Result<Response> {
    let Some(name) = conn.subscriber_name.clone() else {
        return Ok(Response::Ok);
    };
    conn.ctx.fanout.update_interest(&name, |interest| {
        for id in delta.start_monitoring_collections {
            interest.monitored_collections.insert(id);
        }
        for id in delta.stop_monitoring_collections {
            interest.monitored_collections.remove(&id);
        }
        for id in delta.start_monitoring_items {
            interest.monitored_items.insert(id);
        }
        for id in delta.stop_monitoring_items {
            interest.monitored_items.remove(&id);
        }
        for name in delta.start_monitoring_resources {
            interest.monitored_resources.insert(name);
        }
        for name in delta.stop_monitoring_resources {
            interest.monitored_resources.remove(&name);
        }
        for mime in delta.start_monitoring_mime_types {
            interest.monitored_mime_types.insert(mime);
        }
        for mime in delta.stop_monitoring_mime_types {
            interest.monitored_mime_types.remove(&mime);
        }
        for s in delta.start_ignoring_sessions {
            interest.ignored_sessions.insert(s);
        }
        for s in delta.stop_ignoring_sessions {
            interest.ignored_sessions.remove(&s);
        }
        if let Some(v) = delta.set_all_monitored {
            interest.all_monitored = v;
        }
        if let Some(v) = delta.set_exclusive {
            interest.exclusive = v;
        }
        if let Some(v) = delta.want_debug_notifications {
            interest.want_debug_notifications = v;
        }
    });
    Ok(Response::Ok)
}
