//! Message handlers for the API.
//!
//! Endpoints:
//! - POST /api/v1/chats/{id}/messages - Send a message
//! - GET  /api/v1/chats/{id}/messages - One page of history, oldest first
//! - POST /api/v1/chats/{id}/read     - Mark the counterpart's messages read

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};

use parley_types::chat::{
    ChatId, MarkReadRequest, MarkReadResult, Message, MessageId, SendMessageRequest,
};

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::query::{MessageListQuery, NextPageQuery};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/chats/{id}/messages - Send a message as one of the participants.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chat_id: ChatId = parse_id("chat", &id)?;
    let message = state
        .chat_service
        .send_message(&chat_id, &body.sender_id, &body.content)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(message, request_id, elapsed)
        .with_link("chat", &format!("/api/v1/chats/{chat_id}"));

    Ok(Json(resp))
}

/// GET /api/v1/chats/{id}/messages?limit=&before=&viewer_id= - Page through history.
///
/// Empty parameters count as absent. The `next` link, present when the page
/// is full, fetches the page of older messages.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<MessageListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let Query(query) = query?;
    let chat_id: ChatId = parse_id("chat", &id)?;
    let before: Option<MessageId> = query
        .before
        .as_deref()
        .map(|b| parse_id("message", b))
        .transpose()?;

    if state.config.http.require_viewer && query.viewer_id.is_none() {
        return Err(AppError::Validation("viewer_id is required".to_string()));
    }

    let messages = state
        .chat_service
        .get_chat_messages(
            &chat_id,
            query.viewer_id.as_deref(),
            query.limit,
            before.as_ref(),
        )
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let base = format!("/api/v1/chats/{chat_id}/messages");
    let limit = state.chat_service.paging().clamp(query.limit);
    let next = match messages.first() {
        Some(oldest) if messages.len() == limit as usize => {
            let next_query = NextPageQuery {
                before: oldest.id.to_string(),
                limit,
                viewer_id: query.viewer_id.as_deref(),
            };
            let encoded = serde_urlencoded::to_string(&next_query)
                .map_err(|e| AppError::Validation(e.to_string()))?;
            Some(format!("{base}?{encoded}"))
        }
        _ => None,
    };

    let mut resp = ApiResponse::success(messages, request_id, elapsed).with_link("self", &base);
    if let Some(next) = next {
        resp = resp.with_link("next", &next);
    }

    Ok(Json(resp))
}

/// POST /api/v1/chats/{id}/read - Mark every message from the counterpart as read.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<ApiResponse<MarkReadResult>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chat_id: ChatId = parse_id("chat", &id)?;
    let marked = state
        .chat_service
        .mark_messages_as_read(&chat_id, &body.user_id)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let result = MarkReadResult {
        chat_id,
        user_id: body.user_id,
        marked,
    };

    Ok(Json(ApiResponse::success(result, request_id, elapsed)))
}
