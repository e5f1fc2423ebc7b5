use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use homefinder_types::api::{
    Claims, MarkAsReadRequest, MessageListResponse, SendMessageRequest, SendMessageResponse,
    UnreadCountResponse,
};

use crate::auth::AppState;
use crate::conversations;
use crate::convert::message_from_detail;
use crate::error::{ApiError, ApiResult, FieldError, blocking};
use crate::extract::Json;

/// POST /messages — insert one message row with read=false. The receiver
/// and property are verified to exist first; content must be non-empty
/// after trimming.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "content",
            "Message cannot be empty",
        )]));
    }

    let receiver_id = req.receiver_id;
    let property_id = req.property_id;
    let sender_id = claims.sub;

    let receiver = {
        let state = state.clone();
        blocking(move || state.db.get_user_by_id(receiver_id)).await?
    };
    if receiver.is_none() {
        return Err(ApiError::NotFound("Recipient not found".into()));
    }

    let property = {
        let state = state.clone();
        blocking(move || state.db.get_property(property_id)).await?
    };
    if property.is_none() {
        return Err(ApiError::NotFound("Property not found".into()));
    }

    let detail =
        blocking(move || state.db.insert_message(sender_id, receiver_id, property_id, &content))
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: "Message sent successfully".into(),
            data: message_from_detail(&detail),
        }),
    ))
}

/// GET /messages — the caller's raw message list, newest first, parties and
/// property expanded. Conversation grouping is derived from this list (see
/// `conversations::aggregate`), never persisted.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let viewer_id = claims.sub;
    let rows = blocking(move || state.db.get_messages_for_user(viewer_id)).await?;

    Ok(Json(MessageListResponse {
        messages: rows.iter().map(message_from_detail).collect(),
    }))
}

/// GET /messages/unread-count — scalar badge count. Stays consistent with
/// the per-conversation sums by construction: both count messages addressed
/// to the caller with read=false.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let viewer_id = claims.sub;
    let count = blocking(move || state.db.get_unread_count(viewer_id)).await?;

    Ok(Json(UnreadCountResponse { count }))
}

/// POST /messages/mark-as-read — directional: flips messages *from* the
/// given sender *to* the caller. Idempotent.
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MarkAsReadRequest>,
) -> ApiResult<impl IntoResponse> {
    let receiver_id = claims.sub;
    let sender_id = req.sender_id;
    blocking(move || state.db.mark_messages_read(sender_id, receiver_id)).await?;

    Ok(Json(json!({ "success": true })))
}

/// GET /messages/conversation/:userId/:propertyId — the chronological
/// thread with one counterparty about one property. Fetching a thread also
/// marks the counterparty's messages to the caller as read.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path((other_user_id, property_id)): Path<(i64, i64)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let viewer_id = claims.sub;

    let rows = {
        let state = state.clone();
        blocking(move || state.db.get_conversation(viewer_id, other_user_id, property_id)).await?
    };

    // Opening the thread reads it: counterparty → viewer messages flip.
    blocking(move || state.db.mark_messages_read(other_user_id, viewer_id)).await?;

    // The pair filter in the query scopes rows to the viewer's side; the
    // row-level pass keeps that independent of the SQL.
    let messages = conversations::participant_messages(
        viewer_id,
        rows.iter().map(message_from_detail).collect(),
    );

    Ok(Json(MessageListResponse { messages }))
}

/// DELETE /messages/conversation/:userId/:propertyId — permanently deletes
/// the thread for both participants. Zero matched rows still succeeds.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path((other_user_id, property_id)): Path<(i64, i64)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let viewer_id = claims.sub;

    // The DELETE is scoped to the symmetric (viewer, counterparty) pair, so
    // only a thread the caller is part of can be removed.
    blocking(move || state.db.delete_conversation(viewer_id, other_user_id, property_id)).await?;

    Ok(Json(json!({ "message": "Conversation deleted successfully" })))
}
