//! Chat handlers for the API.
//!
//! Endpoints:
//! - POST /api/v1/chats                  - Open (or return) the chat for a pair
//! - GET  /api/v1/chats/{id}             - Get a chat
//! - GET  /api/v1/chats/lookup           - Find the chat for a pair
//! - GET  /api/v1/users/{user_id}/chats  - List a user's chats

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};

use parley_types::chat::{Chat, ChatId, CreateChatRequest};

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::query::LookupQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

fn chat_response(chat: Chat, request_id: String, elapsed: u64) -> ApiResponse<Chat> {
    let self_link = format!("/api/v1/chats/{}", chat.id);
    let messages_link = format!("/api/v1/chats/{}/messages", chat.id);
    ApiResponse::success(chat, request_id, elapsed)
        .with_link("self", &self_link)
        .with_link("messages", &messages_link)
}

/// POST /api/v1/chats - Create a chat, or return the existing one for the pair.
pub async fn create_chat(
    State(state): State<AppState>,
    Json(body): Json<CreateChatRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chat = state
        .chat_service
        .create_chat(&body.user_id1, &body.user_id2)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(chat_response(chat, request_id, elapsed)))
}

/// GET /api/v1/chats/{id} - Get a chat by id.
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chat_id: ChatId = parse_id("chat", &id)?;
    let chat = state.chat_service.get_chat(&chat_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(chat_response(chat, request_id, elapsed)))
}

/// GET /api/v1/chats/lookup?user_id1=&user_id2= - Find the chat for a pair.
pub async fn find_chat(
    State(state): State<AppState>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let Query(query) = query?;
    let chat = state
        .chat_service
        .find_chat(&query.user_id1, &query.user_id2)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(chat_response(chat, request_id, elapsed)))
}

/// GET /api/v1/users/{user_id}/chats - List a user's chats, most recent first.
pub async fn list_user_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Chat>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chats = state.chat_service.get_user_chats(&user_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(chats, request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{user_id}/chats"));

    Ok(Json(resp))
}
