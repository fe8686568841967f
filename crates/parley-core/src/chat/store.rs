//! ChatStore trait definition.
//!
//! Durable CRUD over chats and messages. Implementations enforce the data
//! model invariants with backend constraints and single-statement updates;
//! they never retry and hold no in-process locks.

use parley_types::chat::{Chat, ChatId, Message, MessageId};
use parley_types::error::StoreError;

/// Store trait for chat and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatStore`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ChatStore: Send + Sync {
    /// Create the chat for an unordered participant pair.
    ///
    /// If a chat already exists for `{user_a, user_b}` (in either order) it is
    /// returned with `updated_at` refreshed instead of failing. Returns
    /// `Validation` when `user_a == user_b`.
    fn create_chat(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> impl std::future::Future<Output = Result<Chat, StoreError>> + Send;

    /// Get a chat by id. Returns `NotFound` if absent.
    fn get_chat_by_id(
        &self,
        id: &ChatId,
    ) -> impl std::future::Future<Output = Result<Chat, StoreError>> + Send;

    /// Order-independent lookup by participant pair. Returns `NotFound` if absent.
    fn get_chat_by_participants(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> impl std::future::Future<Output = Result<Chat, StoreError>> + Send;

    /// All chats the user takes part in, most recently active first.
    ///
    /// Ties on `updated_at` are broken by chat id (descending) so the order is
    /// deterministic.
    fn list_chats_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, StoreError>> + Send;

    /// Insert a message and touch the owning chat's `updated_at`.
    ///
    /// A failed touch does not fail the call: the message is durable either
    /// way. Returns `NotFound` if the chat does not exist.
    fn create_message(
        &self,
        chat_id: &ChatId,
        sender_id: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Message, StoreError>> + Send;

    /// One page of a chat's history, oldest first.
    ///
    /// Selects the newest `limit` messages ordered by `(created_at, id)` that
    /// fall strictly before `before` (when given), then returns them in
    /// ascending order. Returns `NotFound` if `before` is not a message of
    /// this chat.
    fn list_messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
        before: Option<&MessageId>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Set `read_at` on every unread message in the chat not sent by `reader_id`.
    ///
    /// Returns the number of messages transitioned; 0 once caught up.
    fn mark_messages_read(
        &self,
        chat_id: &ChatId,
        reader_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
