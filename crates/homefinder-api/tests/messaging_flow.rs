//! End-to-end messaging engine flow against a real (in-memory) database:
//! the tenant-asks-owner scenario, unread transitions, handler-level
//! validation failures, and conversation deletion seen from both sides.

use std::sync::Arc;

use axum::{Extension, extract::Path, extract::State};

use homefinder_api::auth::{AppState, AppStateInner};
use homefinder_api::extract::Json;
use homefinder_api::conversations::aggregate;
use homefinder_api::convert::message_from_detail;
use homefinder_api::error::ApiError;
use homefinder_api::messages;
use homefinder_db::Database;
use homefinder_db::models::UserRow;
use homefinder_types::api::{Claims, SendMessageRequest};
use homefinder_types::models::{Message, Role};

fn test_state() -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
    })
}

fn claims_for(user: &UserRow) -> Claims {
    Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: Role::parse(&user.role).unwrap(),
        exp: usize::MAX,
    }
}

fn seed_user(db: &Database, username: &str, role: &str) -> UserRow {
    db.create_user(
        username,
        &format!("{} Fullname", username),
        &format!("{}@example.com", username),
        "hash",
        role,
    )
    .unwrap()
}

fn messages_for(db: &Database, viewer_id: i64) -> Vec<Message> {
    db.get_messages_for_user(viewer_id)
        .unwrap()
        .iter()
        .map(message_from_detail)
        .collect()
}

#[tokio::test]
async fn tenant_owner_scenario_unread_transitions() {
    let state = test_state();
    let tenant = seed_user(&state.db, "ani", "tenant");
    let owner = seed_user(&state.db, "budi", "owner");
    let property = state
        .db
        .create_property(owner.id, "Kost Melati", "A lovely place to stay", 800_000, "Jakarta", "kost", None)
        .unwrap();

    // Tenant asks about the property.
    messages::send_message(
        State(state.clone()),
        Extension(claims_for(&tenant)),
        Json(SendMessageRequest {
            receiver_id: owner.id,
            property_id: property.id,
            content: "Is it available?".into(),
        }),
    )
    .await
    .expect("send should succeed");

    // Owner sees one conversation with one unread message.
    let owner_conversations = aggregate(owner.id, &messages_for(&state.db, owner.id));
    assert_eq!(owner_conversations.len(), 1);
    assert_eq!(owner_conversations[0].unread_count, 1);
    assert_eq!(owner_conversations[0].last_message.content, "Is it available?");
    assert_eq!(owner_conversations[0].user.id, tenant.id);

    // Owner marks the tenant's messages read.
    state.db.mark_messages_read(tenant.id, owner.id).unwrap();
    assert_eq!(state.db.get_unread_count(owner.id).unwrap(), 0);

    // Owner replies; tenant now has one unread with the reply on top.
    messages::send_message(
        State(state.clone()),
        Extension(claims_for(&owner)),
        Json(SendMessageRequest {
            receiver_id: tenant.id,
            property_id: property.id,
            content: "Yes, from next month.".into(),
        }),
    )
    .await
    .expect("reply should succeed");

    let tenant_conversations = aggregate(tenant.id, &messages_for(&state.db, tenant.id));
    assert_eq!(tenant_conversations.len(), 1);
    assert_eq!(tenant_conversations[0].unread_count, 1);
    assert_eq!(tenant_conversations[0].last_message.content, "Yes, from next month.");

    // The per-conversation sums match the scalar badge count on both sides.
    for viewer in [tenant.id, owner.id] {
        let sum: usize = aggregate(viewer, &messages_for(&state.db, viewer))
            .iter()
            .map(|c| c.unread_count)
            .sum();
        assert_eq!(sum as i64, state.db.get_unread_count(viewer).unwrap());
    }
}

#[tokio::test]
async fn send_message_rejects_empty_content() {
    let state = test_state();
    let tenant = seed_user(&state.db, "ani", "tenant");
    let owner = seed_user(&state.db, "budi", "owner");
    let property = state
        .db
        .create_property(owner.id, "Kost Melati", "A lovely place to stay", 800_000, "Jakarta", "kost", None)
        .unwrap();

    let result = messages::send_message(
        State(state.clone()),
        Extension(claims_for(&tenant)),
        Json(SendMessageRequest {
            receiver_id: owner.id,
            property_id: property.id,
            content: "   \n\t ".into(),
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn send_message_requires_existing_receiver_and_property() {
    let state = test_state();
    let tenant = seed_user(&state.db, "ani", "tenant");
    let owner = seed_user(&state.db, "budi", "owner");
    let property = state
        .db
        .create_property(owner.id, "Kost Melati", "A lovely place to stay", 800_000, "Jakarta", "kost", None)
        .unwrap();

    let missing_receiver = messages::send_message(
        State(state.clone()),
        Extension(claims_for(&tenant)),
        Json(SendMessageRequest {
            receiver_id: 9999,
            property_id: property.id,
            content: "hello".into(),
        }),
    )
    .await;
    assert!(matches!(missing_receiver, Err(ApiError::NotFound(_))));

    let missing_property = messages::send_message(
        State(state.clone()),
        Extension(claims_for(&tenant)),
        Json(SendMessageRequest {
            receiver_id: owner.id,
            property_id: 9999,
            content: "hello".into(),
        }),
    )
    .await;
    assert!(matches!(missing_property, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn opening_a_conversation_marks_it_read() {
    let state = test_state();
    let tenant = seed_user(&state.db, "ani", "tenant");
    let owner = seed_user(&state.db, "budi", "owner");
    let property = state
        .db
        .create_property(owner.id, "Kost Melati", "A lovely place to stay", 800_000, "Jakarta", "kost", None)
        .unwrap();

    state
        .db
        .insert_message(tenant.id, owner.id, property.id, "Is it available?")
        .unwrap();
    assert_eq!(state.db.get_unread_count(owner.id).unwrap(), 1);

    messages::get_conversation(
        State(state.clone()),
        Path((tenant.id, property.id)),
        Extension(claims_for(&owner)),
    )
    .await
    .expect("conversation fetch should succeed");

    assert_eq!(state.db.get_unread_count(owner.id).unwrap(), 0);
}

#[tokio::test]
async fn deleted_conversation_disappears_for_both_participants() {
    let state = test_state();
    let tenant = seed_user(&state.db, "ani", "tenant");
    let owner = seed_user(&state.db, "budi", "owner");
    let property = state
        .db
        .create_property(owner.id, "Kost Melati", "A lovely place to stay", 800_000, "Jakarta", "kost", None)
        .unwrap();

    state
        .db
        .insert_message(tenant.id, owner.id, property.id, "Is it available?")
        .unwrap();
    state
        .db
        .insert_message(owner.id, tenant.id, property.id, "Yes.")
        .unwrap();

    // Tenant unilaterally deletes; the thread is gone for the owner too.
    messages::delete_conversation(
        State(state.clone()),
        Path((owner.id, property.id)),
        Extension(claims_for(&tenant)),
    )
    .await
    .expect("delete should succeed");

    assert!(aggregate(tenant.id, &messages_for(&state.db, tenant.id)).is_empty());
    assert!(aggregate(owner.id, &messages_for(&state.db, owner.id)).is_empty());
    assert!(state.db.get_conversation(tenant.id, owner.id, property.id).unwrap().is_empty());

    // Deleting again (already empty) still succeeds.
    messages::delete_conversation(
        State(state.clone()),
        Path((owner.id, property.id)),
        Extension(claims_for(&tenant)),
    )
    .await
    .expect("deleting an empty conversation is not an error");
}
