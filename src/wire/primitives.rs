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

//! Little-endian primitive encode/decode helpers (§4.2, §6): length-
//! prefixed strings and byte arrays, `count:int32 | items...` sequences.
//! A short read past the end of the buffer is `None`, signalling the
//! codec to wait for more bytes rather than an error.

use bytes::{Buf, BufMut, BytesMut};

pub fn put_i64(buf: &mut BytesMut, v: i64) {
    buf.put_i64_le(v);
}

pub fn put_i32(buf: &mut BytesMut, v: i32) {
    buf.put_i32_le(v);
}

pub fn put_u8(buf: &mut BytesMut, v: u8) {
    buf.put_u8(v);
}

pub fn put_bool(buf: &mut BytesMut, v: bool) {
    buf.put_u8(if v { 1 } else { 0 });
}

pub fn put_bytes(buf: &mut BytesMut, bytes: &[u8]) {
    put_i32(buf, bytes.len() as i32);
    buf.put_slice(bytes);
}

pub fn put_str(buf: &mut BytesMut, s: &str) {
    put_bytes(buf, s.as_bytes());
}

pub fn put_str_vec(buf: &mut BytesMut, v: &[String]) {
    put_i32(buf, v.len() as i32);
    for s in v {
        put_str(buf, s);
    }
}

pub fn put_id_vec(buf: &mut BytesMut, v: &[i64]) {
    put_i32(buf, v.len() as i32);
    for id in v {
        put_i64(buf, *id);
    }
}

/// A cursor over a decode buffer that reports `None` on short reads
/// instead of panicking, so the frame decoder can ask for more bytes.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_i64(&mut self) -> Option<i64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = (&self.buf[self.pos..]).get_i64_le();
        self.pos += 8;
        Some(v)
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = (&self.buf[self.pos..]).get_i32_le();
        self.pos += 4;
        Some(v)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.buf[self.pos];
        self.pos += 1;
        Some(v)
    }

    pub fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    pub fn read_bytes(&mut self) -> Option<Vec<u8>> {
        let len = self.read_i32()? as usize;
        if self.remaining() < len {
            return None;
        }
        let v = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Some(v)
    }

    pub fn read_str(&mut self) -> Option<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).ok()
    }

    pub fn read_str_vec(&mut self) -> Option<Vec<String>> {
        let count = self.read_i32()? as usize;
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            out.push(self.read_str()?);
        }
        Some(out)
    }

    pub fn read_id_vec(&mut self) -> Option<Vec<i64>> {
        let count = self.read_i32()? as usize;
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            out.push(self.read_i64()?);
        }
        Some(out)
    }
}
