//! Messaging handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use core_kernel::ConversationId;
use domain_messaging::{Conversation, Message};

use crate::dto::messaging::*;
use crate::handlers::claims::visible_claim;
use crate::middleware::CurrentUser;
use crate::{error::ApiError, AppState};

/// Opens the claim's conversation, or joins the caller to the existing one
pub async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>), ApiError> {
    visible_claim(&state, &user, request.claim_id).await?;

    let mut participants = vec![user.id];
    participants.extend(request.participants);
    let conversation = state
        .messaging
        .create_conversation(request.claim_id, participants, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Vec<Conversation>> {
    Json(state.messaging.conversations_for_user(user.id).await)
}

/// Messages in a conversation, oldest first
///
/// Fetching the thread marks incoming messages as delivered.
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<Message>>, ApiError> {
    state.messaging.mark_delivered(id, user.id, Utc::now()).await?;
    Ok(Json(state.messaging.messages(id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ConversationId>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    request.validate()?;
    let message = state
        .messaging
        .send_message(id, user.id, request.text, request.attachments, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_delivered(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<MarkedResponse>, ApiError> {
    let updated = state.messaging.mark_delivered(id, user.id, Utc::now()).await?;
    Ok(Json(MarkedResponse { updated }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<MarkedResponse>, ApiError> {
    let updated = state.messaging.mark_read(id, user.id, Utc::now()).await?;
    Ok(Json(MarkedResponse { updated }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<UnreadResponse> {
    Json(UnreadResponse {
        unread: state.messaging.total_unread(user.id).await,
    })
}
