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

//! The length-prefixed frame codec (§4.2, §6): `len:i32 | tag:i64 |
//! discriminator:u8 | body`. `len` counts everything after itself.
//! Implemented as a `tokio_util::codec::{Decoder, Encoder}` pair so a
//! connection can drive it through `Framed` rather than hand-rolling
//! buffering.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::VesselError;

use super::command::Command;
use super::primitives::Reader;
use super::response::Response;

/// Maximum frame body size accepted from a peer (16 MiB), guarding
/// against a malformed or hostile length prefix forcing an unbounded
/// allocation.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// A request frame: a correlation tag plus the command it carries. The
/// tag is echoed back on the matching `Frame<Response>` so a connection
/// can demultiplex out-of-order replies (streamed payloads interleave
/// with ordinary command/response pairs).
#[derive(Debug, Clone)]
pub struct RequestFrame {
    pub tag: i64,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub struct ResponseFrame {
    pub tag: i64,
    pub response: Response,
}

pub struct RequestCodec;

impl Decoder for RequestCodec {
    type Item = RequestFrame;
    type Error = VesselError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }
        let len = (&src[..4]).get_u32_le();
        if len > MAX_FRAME_LEN {
            return Err(VesselError::Protocol(format!(
                "frame length {len} exceeds maximum {MAX_FRAME_LEN}"
            )));
        }
        let total = 4 + len as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }
        let mut frame = src.split_to(total);
        frame.advance(4);
        let mut reader = Reader::new(&frame);
        let tag = reader
            .read_i64()
            .ok_or_else(|| VesselError::Protocol("truncated frame tag".into()))?;
        let discriminator = reader
            .read_u8()
            .ok_or_else(|| VesselError::Protocol("truncated frame discriminator".into()))?;
        let remaining = &frame[reader.position()..];
        let mut body_reader = Reader::new(remaining);
        let command = Command::decode(discriminator, &mut body_reader).ok_or_else(|| {
            VesselError::Protocol(format!("malformed command body for discriminator {discriminator}"))
        })?;
        Ok(Some(RequestFrame { tag, command }))
    }
}

impl Encoder<ResponseFrame> for RequestCodec {
    type Error = VesselError;

    fn encode(&mut self, item: ResponseFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut body = BytesMut::new();
        body.put_i64_le(item.tag);
        body.put_u8(item.response.discriminator());
        item.response.encode(&mut body);
        dst.put_u32_le(body.len() as u32);
        dst.extend_from_slice(&body);
        Ok(())
    }
}

/// The client-facing mirror of `RequestCodec`, used by `vessel-ctl` and
/// by tests that speak the protocol from the other end.
pub struct ResponseCodec;

impl Decoder for ResponseCodec {
    type Item = ResponseFrame;
    type Error = VesselError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }
        let len = (&src[..4]).get_u32_le();
        if len > MAX_FRAME_LEN {
            return Err(VesselError::Protocol(format!(
                "frame length {len} exceeds maximum {MAX_FRAME_LEN}"
            )));
        }
        let total = 4 + len as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }
        let mut frame = src.split_to(total);
        frame.advance(4);
        let mut reader = Reader::new(&frame);
        let tag = reader
            .read_i64()
            .ok_or_else(|| VesselError::Protocol("truncated frame tag".into()))?;
        let discriminator = reader
            .read_u8()
            .ok_or_else(|| VesselError::Protocol("truncated frame discriminator".into()))?;
        let remaining = &frame[reader.position()..];
        let mut body_reader = Reader::new(remaining);
        let response = Response::decode(discriminator, &mut body_reader).ok_or_else(|| {
            VesselError::Protocol(format!("malformed response body for discriminator {discriminator}"))
        })?;
        Ok(Some(ResponseFrame { tag, response }))
    }
}

impl Encoder<RequestFrame> for ResponseCodec {
    type Error = VesselError;

    fn encode(&mut self, item: RequestFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut body = BytesMut::new();
        body.put_i64_le(item.tag);
        body.put_u8(item.command.discriminator());
        item.command.encode(&mut body);
        dst.put_u32_le(body.len() as u32);
        dst.extend_from_slice(&body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::command::CreateItemCmd;

    #[test]
    fn round_trips_a_request_frame_through_both_codec_ends() {
        let mut wire = BytesMut::new();
        ResponseCodec
            .encode(
                RequestFrame { tag: 7, command: Command::Login { session_id: "alice".into() } },
                &mut wire,
            )
            .unwrap();

        let decoded = RequestCodec.decode(&mut wire).unwrap().expect("a full frame was buffered");
        assert_eq!(decoded.tag, 7);
        match decoded.command {
            Command::Login { session_id } => assert_eq!(session_id, "alice"),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn round_trips_a_response_frame_through_both_codec_ends() {
        let mut wire = BytesMut::new();
        RequestCodec
            .encode(ResponseFrame { tag: -1, response: Response::LoginAck }, &mut wire)
            .unwrap();

        let decoded = ResponseCodec.decode(&mut wire).unwrap().expect("a full frame was buffered");
        assert_eq!(decoded.tag, -1);
        assert!(matches!(decoded.response, Response::LoginAck));
    }

    #[test]
    fn decode_waits_for_more_bytes_on_a_partial_frame() {
        let mut wire = BytesMut::new();
        ResponseCodec
            .encode(
                RequestFrame {
                    tag: 1,
                    command: Command::CreateItem(CreateItemCmd {
                        parent_id: 10,
                        mime_type: "text/plain".into(),
                        remote_id: None,
                        gid: None,
                        flags: Vec::new(),
                        parts: Vec::new(),
                    }),
                },
                &mut wire,
            )
            .unwrap();

        let mut truncated = wire.split_to(wire.len() - 1);
        assert!(RequestCodec.decode(&mut truncated).unwrap().is_none());
        assert!(!truncated.is_empty());
    }

    #[test]
    fn decode_rejects_a_frame_longer_than_the_maximum() {
        let mut wire = BytesMut::new();
        wire.put_u32_le(MAX_FRAME_LEN + 1);
        let result = RequestCodec.decode(&mut wire);
        assert!(result.is_err());
    }
}
