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

//! `Response`: server-to-client frames, discriminated in their own
//! 0x80+ range so a frame's shape never depends on which request it
//! answers (§4.2).

use bytes::BytesMut;

use crate::model::{Collection, Item, Relation, Tag};

use super::primitives::*;

fn encode_item(buf: &mut BytesMut, item: &Item) {
    put_i64(buf, item.id);
    put_i64(buf, item.parent_id);
    put_str(buf, &item.mime_type);
    put_bool(buf, item.remote_id.is_some());
    if let Some(v) = &item.remote_id {
        put_str(buf, v);
    }
    put_bool(buf, item.gid.is_some());
    if let Some(v) = &item.gid {
        put_str(buf, v);
    }
    put_i64(buf, item.authoritative_size() as i64);
    put_i64(buf, item.mtime);
    put_i64(buf, item.revision);
    let flags: Vec<String> = item.flags.iter().cloned().collect();
    put_str_vec(buf, &flags);
    let tags: Vec<i64> = item.tags.iter().copied().collect();
    put_id_vec(buf, &tags);
    put_i32(buf, item.parts.len() as i32);
    for (name, part) in &item.parts {
        put_str(buf, name);
        match &part.storage {
            crate::model::PartStorage::Inline(bytes) => {
                put_u8(buf, 0);
                put_bytes(buf, bytes);
            }
            crate::model::PartStorage::External { file_name, size } => {
                put_u8(buf, 1);
                put_str(buf, file_name);
                put_i64(buf, *size as i64);
            }
        }
    }
}

fn encode_collection(buf: &mut BytesMut, c: &Collection) {
    put_i64(buf, c.id);
    put_i64(buf, c.parent_id);
    put_str(buf, &c.name);
    put_str_vec(buf, &c.mime_types);
    put_i64(buf, c.resource_id);
    put_bool(buf, c.enabled);
    put_bool(buf, c.virtual_);
    put_bool(buf, c.referenced);
}

fn encode_tag(buf: &mut BytesMut, t: &Tag) {
    put_i64(buf, t.id);
    put_str(buf, &t.gid);
    put_str(buf, &t.tag_type);
    put_bool(buf, t.parent_id.is_some());
    if let Some(p) = t.parent_id {
        put_i64(buf, p);
    }
}

fn encode_relation(buf: &mut BytesMut, r: &Relation) {
    put_i64(buf, r.key.left_id);
    put_i64(buf, r.key.right_id);
    put_str(buf, &r.key.relation_type);
}

pub(crate) fn encode_notification(buf: &mut BytesMut, n: &crate::notify::types::Notification) {
    put_u8(
        buf,
        match n.kind {
            crate::notify::types::NotificationType::Item => 0,
            crate::notify::types::NotificationType::Collection => 1,
            crate::notify::types::NotificationType::Tag => 2,
            crate::notify::types::NotificationType::Relation => 3,
            crate::notify::types::NotificationType::Subscription => 4,
            crate::notify::types::NotificationType::Debug => 5,
        },
    );
    put_u8(
        buf,
        match n.operation {
            crate::notify::types::Operation::Add => 0,
            crate::notify::types::Operation::Modify => 1,
            crate::notify::types::Operation::ModifyFlags => 2,
            crate::notify::types::Operation::ModifyTags => 3,
            crate::notify::types::Operation::ModifyRelations => 4,
            crate::notify::types::Operation::Move => 5,
            crate::notify::types::Operation::Remove => 6,
            crate::notify::types::Operation::Link => 7,
            crate::notify::types::Operation::Unlink => 8,
            crate::notify::types::Operation::Subscribe => 9,
            crate::notify::types::Operation::Unsubscribe => 10,
        },
    );
    put_i32(buf, n.items.len() as i32);
    for item in &n.items {
        put_i64(buf, item.id);
        put_bool(buf, item.remote_id.is_some());
        if let Some(v) = &item.remote_id {
            put_str(buf, v);
        }
        put_bool(buf, item.mime_type.is_some());
        if let Some(v) = &item.mime_type {
            put_str(buf, v);
        }
    }
    put_bool(buf, n.parent.is_some());
    if let Some(p) = n.parent {
        put_i64(buf, p);
    }
    put_bool(buf, n.parent_dest.is_some());
    if let Some(p) = n.parent_dest {
        put_i64(buf, p);
    }
    put_str_vec(buf, &n.changed_parts);
    put_str_vec(buf, &n.added_flags);
    put_str_vec(buf, &n.removed_flags);
    put_id_vec(buf, &n.added_tags);
    put_id_vec(buf, &n.removed_tags);
    put_str(buf, &n.session);
}

fn decode_item(r: &mut Reader) -> Option<Item> {
    use std::collections::{HashMap, HashSet};

    let id = r.read_i64()?;
    let parent_id = r.read_i64()?;
    let mime_type = r.read_str()?;
    let remote_id = if r.read_bool()? { Some(r.read_str()?) } else { None };
    let gid = if r.read_bool()? { Some(r.read_str()?) } else { None };
    let size = r.read_i64()? as u64;
    let mtime = r.read_i64()?;
    let revision = r.read_i64()?;
    let flags: HashSet<String> = r.read_str_vec()?.into_iter().collect();
    let tags: HashSet<i64> = r.read_id_vec()?.into_iter().collect();
    let part_count = r.read_i32()? as usize;
    let mut parts = HashMap::with_capacity(part_count.min(1024));
    for _ in 0..part_count {
        let name = r.read_str()?;
        let storage = match r.read_u8()? {
            0 => crate::model::PartStorage::Inline(r.read_bytes()?),
            _ => crate::model::PartStorage::External {
                file_name: r.read_str()?,
                size: r.read_i64()? as u64,
            },
        };
        parts.insert(
            name.clone(),
            crate::model::Part {
                name,
                storage,
                version: 0,
            },
        );
    }
    Some(Item {
        id,
        parent_id,
        mime_type,
        remote_id,
        remote_revision: None,
        gid,
        size,
        mtime,
        atime: 0,
        revision,
        flags,
        tags,
        parts,
        dirty: false,
    })
}

fn decode_collection(r: &mut Reader) -> Option<Collection> {
    let id = r.read_i64()?;
    let parent_id = r.read_i64()?;
    let name = r.read_str()?;
    let mime_types = r.read_str_vec()?;
    let resource_id = r.read_i64()?;
    let enabled = r.read_bool()?;
    let virtual_ = r.read_bool()?;
    let referenced = r.read_bool()?;
    Some(Collection {
        id,
        parent_id,
        name,
        mime_types,
        resource_id,
        cache_policy: crate::model::CachePolicy::default(),
        attributes: Default::default(),
        enabled,
        sync_pref: crate::model::Tristate::Undefined,
        display_pref: crate::model::Tristate::Undefined,
        index_pref: crate::model::Tristate::Undefined,
        virtual_,
        referenced,
        persistent_search: None,
        remote_id: None,
        remote_revision: None,
    })
}

fn decode_tag(r: &mut Reader) -> Option<Tag> {
    let id = r.read_i64()?;
    let gid = r.read_str()?;
    let tag_type = r.read_str()?;
    let parent_id = if r.read_bool()? { Some(r.read_i64()?) } else { None };
    Some(Tag {
        id,
        gid,
        tag_type,
        remote_id: None,
        parent_id,
        attributes: Default::default(),
    })
}

fn decode_relation(r: &mut Reader) -> Option<Relation> {
    let left_id = r.read_i64()?;
    let right_id = r.read_i64()?;
    let relation_type = r.read_str()?;
    Some(Relation {
        key: crate::model::RelationKey {
            left_id,
            right_id,
            relation_type,
        },
        remote_id: None,
    })
}

pub(crate) fn decode_notification(r: &mut Reader) -> Option<crate::notify::types::Notification> {
    use crate::notify::types::{EntityRef, Notification, NotificationType, Operation};

    let kind = match r.read_u8()? {
        0 => NotificationType::Item,
        1 => NotificationType::Collection,
        2 => NotificationType::Tag,
        3 => NotificationType::Relation,
        4 => NotificationType::Subscription,
        _ => NotificationType::Debug,
    };
    let operation = match r.read_u8()? {
        0 => Operation::Add,
        1 => Operation::Modify,
        2 => Operation::ModifyFlags,
        3 => Operation::ModifyTags,
        4 => Operation::ModifyRelations,
        5 => Operation::Move,
        6 => Operation::Remove,
        7 => Operation::Link,
        8 => Operation::Unlink,
        9 => Operation::Subscribe,
        _ => Operation::Unsubscribe,
    };
    let item_count = r.read_i32()? as usize;
    let mut items = Vec::with_capacity(item_count.min(1024));
    for _ in 0..item_count {
        let id = r.read_i64()?;
        let remote_id = if r.read_bool()? { Some(r.read_str()?) } else { None };
        let mime_type = if r.read_bool()? { Some(r.read_str()?) } else { None };
        items.push(EntityRef {
            id,
            remote_id,
            remote_revision: None,
            mime_type,
        });
    }
    let parent = if r.read_bool()? { Some(r.read_i64()?) } else { None };
    let parent_dest = if r.read_bool()? { Some(r.read_i64()?) } else { None };
    let changed_parts = r.read_str_vec()?;
    let added_flags = r.read_str_vec()?;
    let removed_flags = r.read_str_vec()?;
    let added_tags = r.read_id_vec()?;
    let removed_tags = r.read_id_vec()?;
    let session = r.read_str()?;
    Some(Notification {
        kind,
        operation,
        items,
        parent,
        parent_dest,
        resource: None,
        destination_resource: None,
        changed_parts,
        added_flags,
        removed_flags,
        added_tags,
        removed_tags,
        session,
    })
}

/// Server-to-client frames. Plain `Ok`/`Error` answer commands with no
/// payload of their own; the rest echo back the entities a fetch/create
/// produced, or push an unsolicited notification (§4.2, §4.6). Response
/// discriminators live in their own 0x80+ range rather than overlaying
/// the request numbering, since a single command (e.g. Fetch) can
/// answer with either entities or an error and the decoder needs an
/// unambiguous tag either way.
#[derive(Debug, Clone)]
pub enum Response {
    Ok,
    Error { message: String, terminal: bool },
    HelloAck { protocol_version: i32 },
    LoginAck,
    Items(Vec<Item>),
    Collections(Vec<Collection>),
    Tags(Vec<Tag>),
    Relations(Vec<Relation>),
    SearchResult(Vec<i64>),
    Notification(crate::notify::types::Notification),
}

impl Response {
    pub fn discriminator(&self) -> u8 {
        match self {
            Response::Ok => 0x80,
            Response::Error { .. } => 0x81,
            Response::HelloAck { .. } => 0x82,
            Response::LoginAck => 0x83,
            Response::Items(_) => 0x84,
            Response::Collections(_) => 0x85,
            Response::Tags(_) => 0x86,
            Response::Relations(_) => 0x87,
            Response::SearchResult(_) => 0x88,
            Response::Notification(_) => 0x89,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Response::Ok | Response::LoginAck => {}
            Response::Error { message, terminal } => {
                put_str(buf, message);
                put_bool(buf, *terminal);
            }
            Response::HelloAck { protocol_version } => put_i32(buf, *protocol_version),
            Response::Items(items) => {
                put_i32(buf, items.len() as i32);
                for item in items {
                    encode_item(buf, item);
                }
            }
            Response::Collections(collections) => {
                put_i32(buf, collections.len() as i32);
                for c in collections {
                    encode_collection(buf, c);
                }
            }
            Response::Tags(tags) => {
                put_i32(buf, tags.len() as i32);
                for t in tags {
                    encode_tag(buf, t);
                }
            }
            Response::Relations(relations) => {
                put_i32(buf, relations.len() as i32);
                for r in relations {
                    encode_relation(buf, r);
                }
            }
            Response::SearchResult(ids) => put_id_vec(buf, ids),
            Response::Notification(n) => encode_notification(buf, n),
        }
    }

    pub fn decode(discriminator: u8, r: &mut Reader) -> Option<Response> {
        Some(match discriminator {
            0x80 => Response::Ok,
            0x81 => Response::Error {
                message: r.read_str()?,
                terminal: r.read_bool()?,
            },
            0x82 => Response::HelloAck {
                protocol_version: r.read_i32()?,
            },
            0x83 => Response::LoginAck,
            0x84 => {
                let count = r.read_i32()? as usize;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(decode_item(r)?);
                }
                Response::Items(items)
            }
            0x85 => {
                let count = r.read_i32()? as usize;
                let mut collections = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    collections.push(decode_collection(r)?);
                }
                Response::Collections(collections)
            }
            0x86 => {
                let count = r.read_i32()? as usize;
                let mut tags = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    tags.push(decode_tag(r)?);
                }
                Response::Tags(tags)
            }
            0x87 => {
                let count = r.read_i32()? as usize;
                let mut relations = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    relations.push(decode_relation(r)?);
                }
                Response::Relations(relations)
            }
            0x88 => Response::SearchResult(r.read_id_vec()?),
            0x89 => Response::Notification(decode_notification(r)?),
            _ => return None,
        })
    }
}
