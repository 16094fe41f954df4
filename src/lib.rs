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

//! A personal-information-management storage and synchronization
//! server: an in-memory transactional item/collection/tag store behind
//! a length-prefixed binary protocol, with change notification
//! fan-out, a crash-survivable change recorder, and a scheduler for
//! periodic resource cache checks.
//!
//! See `SPEC_FULL.md` for the full module-by-module specification and
//! `DESIGN.md` for how each part is grounded.

pub mod agent;
pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod model;
pub mod notify;
pub mod recorder;
pub mod retrieval;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod wire;
