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

//! End-to-end coverage of the command dispatch path: builds a real
//! `ServerContext` (in-memory store, fan-out hub, on-disk change
//! recorder) and drives it through `handlers::dispatch` the same way a
//! connection's frame loop would, without going over a socket.

use tempfile::tempdir;

use vessel::config::ServerConfig;
use vessel::connection::{Connection, SessionState};
use vessel::handlers::dispatch;
use vessel::model::{CachePolicy, FetchScope, Scope, ScopeContext, Tristate, ROOT_ID};
use vessel::server::build_context;
use vessel::wire::command::{
    CreateCollectionCmd, CreateItemCmd, DeleteCmd, DestinationCmd, EntityKind, LinkCmd, ModifyCollectionCmd,
    ModifyItemFields, SubscriptionDelta,
};
use vessel::wire::{Command, Response};

fn test_config() -> (tempfile::TempDir, ServerConfig) {
    let dir = tempdir().unwrap();
    let mut config = ServerConfig::default();
    config.payload_dir = dir.path().join("payloads");
    config.recorder_path = dir.path().join("changes.log");
    (dir, config)
}

async fn login(conn: &mut Connection, session_id: &str) {
    let response = dispatch(conn, Command::Login { session_id: session_id.to_string() }).await;
    assert!(matches!(response, Response::LoginAck));
    assert_eq!(conn.state, SessionState::Authenticated);
}

async fn create_collection(conn: &mut Connection) -> i64 {
    let cmd = CreateCollectionCmd {
        parent_id: ROOT_ID,
        name: "inbox".into(),
        resource: "mail".into(),
        mime_types: vec!["message/rfc822".into()],
        remote_id: None,
        virtual_: false,
    };
    match dispatch(conn, Command::CreateCollection(cmd)).await {
        Response::Collections(collections) => collections[0].id,
        other => panic!("unexpected response: {other:?}"),
    }
}

async fn create_collection_in(conn: &mut Connection, resource: &str) -> i64 {
    let cmd = CreateCollectionCmd {
        parent_id: ROOT_ID,
        name: "inbox".into(),
        resource: resource.into(),
        mime_types: vec!["message/rfc822".into()],
        remote_id: None,
        virtual_: false,
    };
    match dispatch(conn, Command::CreateCollection(cmd)).await {
        Response::Collections(collections) => collections[0].id,
        other => panic!("unexpected response: {other:?}"),
    }
}

fn empty_modify_collection(id: i64) -> ModifyCollectionCmd {
    ModifyCollectionCmd {
        id,
        name: None,
        parent_id: None,
        remote_id: None,
        remote_revision: None,
        mime_types: None,
        enabled: None,
        sync_pref: None,
        display_pref: None,
        index_pref: None,
        cache_policy: None,
        persistent_search: None,
        attributes: Vec::new(),
        removed_attributes: Vec::new(),
        referenced: None,
    }
}

#[tokio::test]
async fn modifying_a_collection_applies_every_field() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;
    let collection_id = create_collection(&mut conn).await;

    let modify = ModifyCollectionCmd {
        name: Some("renamed".into()),
        remote_revision: Some("rev-2".into()),
        mime_types: Some(vec!["text/calendar".into()]),
        display_pref: Some(Tristate::True),
        index_pref: Some(Tristate::False),
        cache_policy: Some(CachePolicy {
            inherit: false,
            sync_pref: Tristate::True,
            check_interval_secs: Some(120),
            cached_parts: vec!["PLD:RFC822".into()],
            cache_timeout_secs: None,
        }),
        attributes: vec![("color".into(), b"blue".to_vec())],
        referenced: Some(true),
        ..empty_modify_collection(collection_id)
    };
    match dispatch(&mut conn, Command::ModifyCollection(modify)).await {
        Response::Collections(collections) => {
            let collection = &collections[0];
            assert_eq!(collection.name, "renamed");
            assert_eq!(collection.remote_revision.as_deref(), Some("rev-2"));
            assert_eq!(collection.mime_types, vec!["text/calendar".to_string()]);
            assert_eq!(collection.display_pref, Tristate::True);
            assert_eq!(collection.index_pref, Tristate::False);
            assert_eq!(collection.cache_policy.check_interval_secs, Some(120));
            assert_eq!(collection.attributes.get("color"), Some(&b"blue".to_vec()));
            assert!(collection.referenced);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    // A second modify removes the attribute just added.
    let remove = ModifyCollectionCmd {
        removed_attributes: vec!["color".into()],
        ..empty_modify_collection(collection_id)
    };
    match dispatch(&mut conn, Command::ModifyCollection(remove)).await {
        Response::Collections(collections) => assert!(!collections[0].attributes.contains_key("color")),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn moving_a_collection_across_resources_replays_its_subtree() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;

    let source = create_collection_in(&mut conn, "mail-a").await;
    let destination = create_collection_in(&mut conn, "mail-b").await;

    let create = CreateItemCmd {
        parent_id: source,
        mime_type: "message/rfc822".into(),
        remote_id: Some("remote-item".into()),
        gid: None,
        flags: Vec::new(),
        parts: Vec::new(),
    };
    let item_id = match dispatch(&mut conn, Command::CreateItem(create)).await {
        Response::Items(items) => items[0].id,
        other => panic!("unexpected response: {other:?}"),
    };

    let move_cmd = DestinationCmd {
        kind: EntityKind::Collection,
        scope: Scope::uid(source),
        context: ScopeContext::default(),
        destination,
    };
    let moved_id = match dispatch(&mut conn, Command::Move(move_cmd)).await {
        Response::Collections(collections) => {
            assert_eq!(collections.len(), 1);
            assert_ne!(collections[0].id, source, "a cross-resource move replays with a fresh id");
            assert_eq!(collections[0].parent_id, destination);
            assert!(collections[0].remote_id.is_none());
            collections[0].id
        }
        other => panic!("unexpected response: {other:?}"),
    };

    // The old collection id is gone.
    let refetch_old = Command::FetchCollections { scope: Scope::uid(source), context: ScopeContext::default() };
    match dispatch(&mut conn, refetch_old).await {
        Response::Collections(collections) => assert!(collections.is_empty()),
        other => panic!("unexpected response: {other:?}"),
    }

    // The old item id no longer resolves...
    let refetch_old_item = Command::FetchItems {
        scope: Scope::uid(item_id),
        context: ScopeContext::default(),
        fetch_scope: FetchScope::default(),
    };
    match dispatch(&mut conn, refetch_old_item).await {
        Response::Items(items) => assert!(items.is_empty(), "the old item id should no longer resolve"),
        other => panic!("unexpected response: {other:?}"),
    }

    // ...but its replay, allocated right after the collection's new id,
    // lives under the moved collection with its remote id cleared.
    let fetch_moved = Command::FetchItems {
        scope: Scope::uid(moved_id + 1),
        context: ScopeContext::default(),
        fetch_scope: FetchScope::default(),
    };
    match dispatch(&mut conn, fetch_moved).await {
        Response::Items(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].parent_id, moved_id);
            assert!(items[0].remote_id.is_none());
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn create_fetch_modify_and_delete_an_item() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;
    let collection_id = create_collection(&mut conn).await;

    let create = CreateItemCmd {
        parent_id: collection_id,
        mime_type: "message/rfc822".into(),
        remote_id: Some("remote-1".into()),
        gid: Some("gid-1".into()),
        flags: vec!["\\Seen".into()],
        parts: vec![("PLD:RFC822".into(), b"hello".to_vec())],
    };
    let response = dispatch(&mut conn, Command::CreateItem(create)).await;
    let item_id = match response {
        Response::Items(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].parent_id, collection_id);
            assert_eq!(items[0].revision, 0);
            items[0].id
        }
        other => panic!("unexpected response: {other:?}"),
    };

    let fetch = Command::FetchItems {
        scope: Scope::uid(item_id),
        context: ScopeContext::default(),
        fetch_scope: FetchScope { full_payload: true, ..Default::default() },
    };
    match dispatch(&mut conn, fetch).await {
        Response::Items(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].id, item_id);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let modify = Command::ModifyItem {
        scope: Scope::uid(item_id),
        context: ScopeContext::default(),
        fields: ModifyItemFields {
            flags: None,
            added_flags: vec!["\\Flagged".into()],
            removed_flags: Vec::new(),
            tags: None,
            added_tags: Vec::new(),
            removed_tags: Vec::new(),
            remote_id: None,
            remote_revision: None,
            gid: None,
            size: None,
            parts: Vec::new(),
            removed_parts: Vec::new(),
            attributes: Vec::new(),
            old_revision: Some(0),
            dirty: false,
            invalidate_cache: false,
            no_response: false,
            notify: true,
        },
    };
    match dispatch(&mut conn, modify).await {
        Response::Items(items) => {
            assert_eq!(items[0].revision, 1);
            assert!(items[0].flags.contains("\\Flagged"));
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let delete = DeleteCmd { kind: EntityKind::Item, scope: Scope::uid(item_id), context: ScopeContext::default() };
    let response = dispatch(&mut conn, Command::Delete(delete)).await;
    assert!(matches!(response, Response::Ok));

    let refetch = Command::FetchItems {
        scope: Scope::uid(item_id),
        context: ScopeContext::default(),
        fetch_scope: FetchScope::default(),
    };
    match dispatch(&mut conn, refetch).await {
        Response::Items(items) => assert!(items.is_empty()),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn modify_rejects_a_stale_revision() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;
    let collection_id = create_collection(&mut conn).await;

    let create = CreateItemCmd {
        parent_id: collection_id,
        mime_type: "message/rfc822".into(),
        remote_id: None,
        gid: None,
        flags: Vec::new(),
        parts: Vec::new(),
    };
    let item_id = match dispatch(&mut conn, Command::CreateItem(create)).await {
        Response::Items(items) => items[0].id,
        other => panic!("unexpected response: {other:?}"),
    };

    let modify = Command::ModifyItem {
        scope: Scope::uid(item_id),
        context: ScopeContext::default(),
        fields: ModifyItemFields {
            flags: None,
            added_flags: Vec::new(),
            removed_flags: Vec::new(),
            tags: None,
            added_tags: Vec::new(),
            removed_tags: Vec::new(),
            remote_id: None,
            remote_revision: None,
            gid: None,
            size: None,
            parts: Vec::new(),
            removed_parts: Vec::new(),
            attributes: Vec::new(),
            old_revision: Some(7),
            dirty: false,
            invalidate_cache: false,
            no_response: false,
            notify: true,
        },
    };
    match dispatch(&mut conn, modify).await {
        Response::Error { terminal, .. } => assert!(!terminal),
        other => panic!("expected a conflict error, got {other:?}"),
    }
}

#[tokio::test]
async fn moving_an_item_changes_its_parent_and_keeps_its_id() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;
    let source = create_collection(&mut conn).await;
    let destination = create_collection(&mut conn).await;

    let create = CreateItemCmd {
        parent_id: source,
        mime_type: "message/rfc822".into(),
        remote_id: None,
        gid: None,
        flags: Vec::new(),
        parts: Vec::new(),
    };
    let item_id = match dispatch(&mut conn, Command::CreateItem(create)).await {
        Response::Items(items) => items[0].id,
        other => panic!("unexpected response: {other:?}"),
    };

    let move_cmd = DestinationCmd {
        kind: EntityKind::Item,
        scope: Scope::uid(item_id),
        context: ScopeContext::default(),
        destination,
    };
    match dispatch(&mut conn, Command::Move(move_cmd)).await {
        Response::Items(items) => {
            assert_eq!(items[0].id, item_id);
            assert_eq!(items[0].parent_id, destination);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn linking_an_item_into_a_virtual_collection_requires_a_virtual_target() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;
    let source = create_collection(&mut conn).await;

    let create = CreateItemCmd {
        parent_id: source,
        mime_type: "message/rfc822".into(),
        remote_id: None,
        gid: None,
        flags: Vec::new(),
        parts: Vec::new(),
    };
    let item_id = match dispatch(&mut conn, Command::CreateItem(create)).await {
        Response::Items(items) => items[0].id,
        other => panic!("unexpected response: {other:?}"),
    };

    // Linking into a non-virtual collection is rejected.
    let link = LinkCmd { collection_id: source, items: Scope::uid(item_id) };
    match dispatch(&mut conn, Command::Link(link)).await {
        Response::Error { terminal, .. } => assert!(!terminal),
        other => panic!("expected a constraint error, got {other:?}"),
    }

    // A virtual collection accepts the link.
    let virtual_collection = CreateCollectionCmd {
        parent_id: ROOT_ID,
        name: "starred".into(),
        resource: "search".into(),
        mime_types: Vec::new(),
        remote_id: None,
        virtual_: true,
    };
    let virtual_id = match dispatch(&mut conn, Command::CreateCollection(virtual_collection)).await {
        Response::Collections(collections) => collections[0].id,
        other => panic!("unexpected response: {other:?}"),
    };
    let link = LinkCmd { collection_id: virtual_id, items: Scope::uid(item_id) };
    let response = dispatch(&mut conn, Command::Link(link)).await;
    assert!(matches!(response, Response::Ok));
}

#[tokio::test]
async fn tags_and_relations_round_trip() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();
    let mut conn = Connection::new(ctx);
    login(&mut conn, "session-1").await;
    let collection_id = create_collection(&mut conn).await;

    let mk_item = |parent_id| CreateItemCmd {
        parent_id,
        mime_type: "message/rfc822".into(),
        remote_id: None,
        gid: None,
        flags: Vec::new(),
        parts: Vec::new(),
    };
    let left = match dispatch(&mut conn, Command::CreateItem(mk_item(collection_id))).await {
        Response::Items(items) => items[0].id,
        other => panic!("unexpected response: {other:?}"),
    };
    let right = match dispatch(&mut conn, Command::CreateItem(mk_item(collection_id))).await {
        Response::Items(items) => items[0].id,
        other => panic!("unexpected response: {other:?}"),
    };

    let create_tag = Command::CreateTag { gid: "important".into(), tag_type: "PLAIN".into(), parent_id: None };
    let tag_id = match dispatch(&mut conn, create_tag).await {
        Response::Tags(tags) => tags[0].id,
        other => panic!("unexpected response: {other:?}"),
    };
    assert!(tag_id > 0);

    let create_relation =
        Command::CreateRelation { left_id: left, right_id: right, relation_type: "DUPLICATE".into() };
    let response = dispatch(&mut conn, create_relation).await;
    assert!(matches!(response, Response::Relations(_)));

    // Creating the same relation again, in either direction, is rejected.
    let duplicate = Command::CreateRelation { left_id: right, right_id: left, relation_type: "DUPLICATE".into() };
    match dispatch(&mut conn, duplicate).await {
        Response::Error { terminal, .. } => assert!(!terminal),
        other => panic!("expected a constraint error, got {other:?}"),
    }

    let fetch_relations = Command::FetchRelations { item_id: left, relation_type: None };
    match dispatch(&mut conn, fetch_relations).await {
        Response::Relations(relations) => assert_eq!(relations.len(), 1),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn a_subscriber_sees_notifications_from_other_sessions_once_monitoring_everything() {
    let (_dir, config) = test_config();
    let ctx = build_context(&config).unwrap();

    let mut subscriber = Connection::new(ctx.clone());
    login(&mut subscriber, "subscriber").await;
    let subscribe =
        Command::CreateSubscription { subscriber_name: "watcher".into(), session: "subscriber".into() };
    assert!(matches!(dispatch(&mut subscriber, subscribe).await, Response::Ok));
    let delta = SubscriptionDelta {
        start_monitoring_collections: Vec::new(),
        stop_monitoring_collections: Vec::new(),
        start_monitoring_items: Vec::new(),
        stop_monitoring_items: Vec::new(),
        start_monitoring_resources: Vec::new(),
        stop_monitoring_resources: Vec::new(),
        start_monitoring_mime_types: Vec::new(),
        stop_monitoring_mime_types: Vec::new(),
        start_ignoring_sessions: Vec::new(),
        stop_ignoring_sessions: Vec::new(),
        set_all_monitored: Some(true),
        set_exclusive: None,
        want_debug_notifications: None,
    };
    assert!(matches!(
        dispatch(&mut subscriber, Command::ModifySubscription(delta)).await,
        Response::Ok
    ));

    let mut writer = Connection::new(ctx);
    login(&mut writer, "writer").await;
    let collection_id = create_collection(&mut writer).await;
    let create = CreateItemCmd {
        parent_id: collection_id,
        mime_type: "message/rfc822".into(),
        remote_id: None,
        gid: None,
        flags: Vec::new(),
        parts: Vec::new(),
    };
    assert!(matches!(dispatch(&mut writer, Command::CreateItem(create)).await, Response::Items(_)));

    let notification = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        subscriber.notify_rx.as_mut().unwrap().recv().await
    })
    .await
    .expect("subscriber should receive a notification within the timeout");
    assert!(notification.is_some());
}
