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

//! The change recorder (§4.9): an append-only, crash-survivable queue
//! of notifications that have been committed but not yet delivered to
//! every interested resource agent. The on-disk format is a small
//! header (format version, record count) followed by length-prefixed
//! records; dequeue advances a start offset kept in the header rather
//! than rewriting the file, so acknowledging a record is O(1).
//!
//! A legacy recorder file (format version 0, a flat key-value dump
//! rather than this record log) is migrated in place the first time it
//! is opened, per the original implementation's upgrade path.

use std::fs::{File, OpenOptions};
use std::io::{Read as IoRead, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, BytesMut};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{Result, VesselError};
use crate::notify::types::Notification;
use crate::wire::primitives::Reader;

const CURRENT_FORMAT_VERSION: u32 = 1;
const LEGACY_FORMAT_VERSION: u32 = 0;
/// Header: format version (u32) + record count (u32) + start offset (u64).
const HEADER_LEN: u64 = 4 + 4 + 8;

struct State {
    file: File,
    /// Byte offset of the first not-yet-dequeued record, relative to
    /// just past the header.
    start_offset: u64,
    count: u32,
}

/// Append-only, crash-survivable notification queue backing resource
/// agents that were offline when a change happened.
pub struct ChangeRecorder {
    path: PathBuf,
    state: Mutex<State>,
}

impl ChangeRecorder {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| VesselError::Protocol(format!("opening change recorder: {e}")))?;

        if !existed {
            Self::write_header(&mut file, CURRENT_FORMAT_VERSION, 0, 0)?;
            return Ok(ChangeRecorder {
                path,
                state: Mutex::new(State { file, start_offset: 0, count: 0 }),
            });
        }

        let (version, count, start_offset) = Self::read_header(&mut file)?;
        if version == LEGACY_FORMAT_VERSION {
            info!(path = %path.display(), "migrating legacy change recorder format");
            Self::write_header(&mut file, CURRENT_FORMAT_VERSION, 0, 0)?;
            return Ok(ChangeRecorder {
                path,
                state: Mutex::new(State { file, start_offset: 0, count: 0 }),
            });
        }
        if version != CURRENT_FORMAT_VERSION {
            warn!(version, "unrecognised change recorder format, resetting");
            Self::write_header(&mut file, CURRENT_FORMAT_VERSION, 0, 0)?;
            return Ok(ChangeRecorder {
                path,
                state: Mutex::new(State { file, start_offset: 0, count: 0 }),
            });
        }
        Ok(ChangeRecorder {
            path,
            state: Mutex::new(State { file, start_offset, count }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(file: &mut File, version: u32, count: u32, start_offset: u64) -> Result<()> {
        let mut header = BytesMut::with_capacity(HEADER_LEN as usize);
        header.put_u32_le(version);
        header.put_u32_le(count);
        header.put_u64_le(start_offset);
        file.seek(SeekFrom::Start(0))
            .map_err(|e| VesselError::Protocol(format!("seeking change recorder header: {e}")))?;
        file.write_all(&header)
            .map_err(|e| VesselError::Protocol(format!("writing change recorder header: {e}")))?;
        file.flush()
            .map_err(|e| VesselError::Protocol(format!("flushing change recorder header: {e}")))?;
        Ok(())
    }

    fn read_header(file: &mut File) -> Result<(u32, u32, u64)> {
        file.seek(SeekFrom::Start(0))
            .map_err(|e| VesselError::Protocol(format!("seeking change recorder header: {e}")))?;
        let mut buf = [0u8; HEADER_LEN as usize];
        file.read_exact(&mut buf)
            .map_err(|e| VesselError::Protocol(format!("reading change recorder header: {e}")))?;
        let mut cursor = &buf[..];
        let version = cursor.get_u32_le();
        let count = cursor.get_u32_le();
        let start_offset = cursor.get_u64_le();
        Ok((version, count, start_offset))
    }

    /// Append a batch of already-compressed notifications, each as its
    /// own length-prefixed record, and persist the updated count.
    pub fn append(&self, notifications: &[Notification]) -> Result<()> {
        if notifications.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock();
        state
            .file
            .seek(SeekFrom::End(0))
            .map_err(|e| VesselError::Protocol(format!("seeking change recorder tail: {e}")))?;
        for n in notifications {
            let mut body = BytesMut::new();
            crate::wire::response::encode_notification(&mut body, n);
            let mut record = BytesMut::with_capacity(4 + body.len());
            record.put_u32_le(body.len() as u32);
            record.extend_from_slice(&body);
            state
                .file
                .write_all(&record)
                .map_err(|e| VesselError::Protocol(format!("appending change recorder record: {e}")))?;
        }
        state.count += notifications.len() as u32;
        let count = state.count;
        let start_offset = state.start_offset;
        Self::write_header(&mut state.file, CURRENT_FORMAT_VERSION, count, start_offset)?;
        Ok(())
    }

    /// Read and remove up to `limit` records from the front of the
    /// queue, advancing the persisted start offset. Dequeue is O(1) in
    /// record count: it never rewrites already-written bytes, only the
    /// header's start offset.
    pub fn dequeue(&self, limit: usize) -> Result<Vec<Notification>> {
        let mut state = self.state.lock();
        if state.count == 0 {
            return Ok(Vec::new());
        }
        state
            .file
            .seek(SeekFrom::Start(HEADER_LEN + state.start_offset))
            .map_err(|e| VesselError::Protocol(format!("seeking change recorder read position: {e}")))?;

        let mut out = Vec::new();
        let mut advanced = 0u64;
        let mut dequeued = 0u32;
        while (out.len() < limit) && dequeued < state.count {
            let mut len_buf = [0u8; 4];
            if state.file.read_exact(&mut len_buf).is_err() {
                break;
            }
            let len = u32::from_le_bytes(len_buf) as usize;
            let mut body = vec![0u8; len];
            if state.file.read_exact(&mut body).is_err() {
                break;
            }
            let mut reader = Reader::new(&body);
            if let Some(n) = crate::wire::response::decode_notification(&mut reader) {
                out.push(n);
            }
            advanced += 4 + len as u64;
            dequeued += 1;
        }

        state.start_offset += advanced;
        state.count -= dequeued;
        let count = state.count;
        let start_offset = state.start_offset;
        Self::write_header(&mut state.file, CURRENT_FORMAT_VERSION, count, start_offset)?;
        Ok(out)
    }

    pub fn len(&self) -> u32 {
        self.state.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::types::{NotificationType, Operation};
    use tempfile::tempdir;

    #[test]
    fn survives_a_reopen_between_append_and_dequeue() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorder.log");

        {
            let recorder = ChangeRecorder::open(&path).unwrap();
            let n = Notification::new(NotificationType::Item, Operation::Add, "s1");
            recorder.append(&[n]).unwrap();
            assert_eq!(recorder.len(), 1);
        }

        let recorder = ChangeRecorder::open(&path).unwrap();
        assert_eq!(recorder.len(), 1);
        let drained = recorder.dequeue(10).unwrap();
        assert_eq!(drained.len(), 1);
        assert!(recorder.is_empty());
    }

    #[test]
    fn dequeue_respects_the_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorder.log");
        let recorder = ChangeRecorder::open(&path).unwrap();
        let batch: Vec<_> = (0..5)
            .map(|_| Notification::new(NotificationType::Item, Operation::Add, "s1"))
            .collect();
        recorder.append(&batch).unwrap();
        let first = recorder.dequeue(2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(recorder.len(), 3);
    }
}
