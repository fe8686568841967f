//! Conversation service layered over the chat store.
//!
//! ChatService adds the rules the store has no notion of: who counts as a
//! participant, and how big a history page may be. It is the only component
//! adapters (HTTP, CLI) talk to.

use parley_types::chat::{Chat, ChatId, Message, MessageId};
use parley_types::config::PagingConfig;
use parley_types::error::ChatError;
use tracing::{debug, error, info, warn};

use crate::chat::store::ChatStore;

/// Participant checks and paging rules over a `ChatStore`.
///
/// Generic over the store so tests can substitute an in-memory fake
/// (parley-core never depends on parley-infra).
pub struct ChatService<S: ChatStore> {
    store: S,
    paging: PagingConfig,
}

impl<S: ChatStore> ChatService<S> {
    /// Create a new chat service over `store` with the given page sizes.
    pub fn new(store: S, paging: PagingConfig) -> Self {
        Self { store, paging }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn paging(&self) -> &PagingConfig {
        &self.paging
    }

    // --- Chats ---

    /// Create (or return the existing) chat between two users.
    ///
    /// Idempotent by pair: argument order does not matter.
    pub async fn create_chat(&self, user_a: &str, user_b: &str) -> Result<Chat, ChatError> {
        if user_a == user_b {
            return Err(ChatError::Validation(
                "cannot create chat with yourself".to_string(),
            ));
        }

        let chat = self.store.create_chat(user_a, user_b).await.map_err(|e| {
            error!(error = %e, user_a, user_b, "Failed to create chat");
            ChatError::from(e)
        })?;

        info!(
            chat_id = %chat.id,
            user_id1 = %chat.user_id1,
            user_id2 = %chat.user_id2,
            "Chat created"
        );
        Ok(chat)
    }

    /// Get a chat by id.
    pub async fn get_chat(&self, chat_id: &ChatId) -> Result<Chat, ChatError> {
        self.store.get_chat_by_id(chat_id).await.map_err(|e| {
            debug!(chat_id = %chat_id, error = %e, "Failed to get chat");
            ChatError::from(e)
        })
    }

    /// Find the chat between two users, in either order.
    pub async fn find_chat(&self, user_a: &str, user_b: &str) -> Result<Chat, ChatError> {
        self.store
            .get_chat_by_participants(user_a, user_b)
            .await
            .map_err(|e| {
                debug!(user_a, user_b, error = %e, "Failed to find chat");
                ChatError::from(e)
            })
    }

    /// List a user's chats, most recently active first.
    pub async fn get_user_chats(&self, user_id: &str) -> Result<Vec<Chat>, ChatError> {
        self.store.list_chats_for_user(user_id).await.map_err(|e| {
            error!(user_id, error = %e, "Failed to get user chats");
            ChatError::from(e)
        })
    }

    // --- Messages ---

    /// Send a message into a chat on behalf of one of its participants.
    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        sender_id: &str,
        content: &str,
    ) -> Result<Message, ChatError> {
        let chat = self.load_chat_for(chat_id, sender_id).await?;

        if content.is_empty() {
            return Err(ChatError::Validation(
                "message content cannot be empty".to_string(),
            ));
        }

        let message = self
            .store
            .create_message(&chat.id, sender_id, content)
            .await
            .map_err(|e| {
                error!(chat_id = %chat_id, sender_id, error = %e, "Failed to send message");
                ChatError::from(e)
            })?;

        info!(
            message_id = %message.id,
            chat_id = %chat_id,
            sender_id,
            "Message sent"
        );
        Ok(message)
    }

    /// Get one page of a chat's history, oldest first.
    ///
    /// `limit` is clamped by the paging config. When `viewer` is given it must
    /// be a participant of the chat; without a viewer the history is returned
    /// as-is (access control is then the caller's concern).
    pub async fn get_chat_messages(
        &self,
        chat_id: &ChatId,
        viewer: Option<&str>,
        limit: Option<i64>,
        before: Option<&MessageId>,
    ) -> Result<Vec<Message>, ChatError> {
        if let Some(viewer) = viewer {
            self.load_chat_for(chat_id, viewer).await?;
        }

        let limit = self.paging.clamp(limit);
        self.store
            .list_messages(chat_id, limit, before)
            .await
            .map_err(|e| {
                error!(chat_id = %chat_id, error = %e, "Failed to get chat messages");
                ChatError::from(e)
            })
    }

    /// Mark every message the counterpart sent as read by `user_id`.
    ///
    /// Returns how many messages changed state; a repeated call returns 0.
    pub async fn mark_messages_as_read(
        &self,
        chat_id: &ChatId,
        user_id: &str,
    ) -> Result<u64, ChatError> {
        self.load_chat_for(chat_id, user_id).await?;

        let count = self
            .store
            .mark_messages_read(chat_id, user_id)
            .await
            .map_err(|e| {
                error!(chat_id = %chat_id, user_id, error = %e, "Failed to mark messages as read");
                ChatError::from(e)
            })?;

        if count > 0 {
            info!(chat_id = %chat_id, user_id, count, "Messages marked as read");
        }
        Ok(count)
    }

    /// Load a chat and require `user_id` to be one of its participants.
    async fn load_chat_for(&self, chat_id: &ChatId, user_id: &str) -> Result<Chat, ChatError> {
        let chat = self.store.get_chat_by_id(chat_id).await?;
        if !chat.has_participant(user_id) {
            warn!(chat_id = %chat_id, user_id, "Rejected non-participant");
            return Err(ChatError::PermissionDenied {
                user_id: user_id.to_string(),
            });
        }
        Ok(chat)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use parley_types::chat::canonical_pair;
    use parley_types::error::StoreError;

    use super::*;

    /// In-memory `ChatStore` with the same ordering rules as the SQLite store.
    #[derive(Default)]
    struct MemoryStore {
        chats: Mutex<Vec<Chat>>,
        messages: Mutex<Vec<Message>>,
        offline: bool,
    }

    impl MemoryStore {
        fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.offline {
                Err(StoreError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        fn message_count(&self) -> usize {
            self.messages.lock().unwrap().len()
        }
    }

    impl ChatStore for MemoryStore {
        async fn create_chat(&self, user_a: &str, user_b: &str) -> Result<Chat, StoreError> {
            self.check()?;
            if user_a == user_b {
                return Err(StoreError::Validation("self chat".to_string()));
            }
            let (u1, u2) = canonical_pair(user_a, user_b);
            let mut chats = self.chats.lock().unwrap();
            if let Some(chat) = chats
                .iter_mut()
                .find(|c| c.user_id1 == u1 && c.user_id2 == u2)
            {
                chat.updated_at = Utc::now();
                return Ok(chat.clone());
            }
            let now = Utc::now();
            let chat = Chat {
                id: ChatId::new(),
                user_id1: u1.to_string(),
                user_id2: u2.to_string(),
                created_at: now,
                updated_at: now,
            };
            chats.push(chat.clone());
            Ok(chat)
        }

        async fn get_chat_by_id(&self, id: &ChatId) -> Result<Chat, StoreError> {
            self.check()?;
            self.chats
                .lock()
                .unwrap()
                .iter()
                .find(|c| &c.id == id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound("chat".to_string()))
        }

        async fn get_chat_by_participants(
            &self,
            user_a: &str,
            user_b: &str,
        ) -> Result<Chat, StoreError> {
            self.check()?;
            let (u1, u2) = canonical_pair(user_a, user_b);
            self.chats
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.user_id1 == u1 && c.user_id2 == u2)
                .cloned()
                .ok_or_else(|| StoreError::NotFound("chat".to_string()))
        }

        async fn list_chats_for_user(&self, user_id: &str) -> Result<Vec<Chat>, StoreError> {
            self.check()?;
            let mut chats: Vec<Chat> = self
                .chats
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.has_participant(user_id))
                .cloned()
                .collect();
            chats.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)));
            Ok(chats)
        }

        async fn create_message(
            &self,
            chat_id: &ChatId,
            sender_id: &str,
            content: &str,
        ) -> Result<Message, StoreError> {
            self.check()?;
            let now = Utc::now();
            {
                let mut chats = self.chats.lock().unwrap();
                let chat = chats
                    .iter_mut()
                    .find(|c| &c.id == chat_id)
                    .ok_or_else(|| StoreError::NotFound("chat".to_string()))?;
                chat.updated_at = now;
            }
            let message = Message {
                id: MessageId::new(),
                chat_id: *chat_id,
                sender_id: sender_id.to_string(),
                content: content.to_string(),
                created_at: now,
                read_at: None,
            };
            self.messages.lock().unwrap().push(message.clone());
            Ok(message)
        }

        async fn list_messages(
            &self,
            chat_id: &ChatId,
            limit: u32,
            before: Option<&MessageId>,
        ) -> Result<Vec<Message>, StoreError> {
            self.check()?;
            let messages = self.messages.lock().unwrap();
            let cursor = match before {
                Some(id) => Some(
                    messages
                        .iter()
                        .find(|m| &m.id == id && &m.chat_id == chat_id)
                        .map(|m| (m.created_at, m.id))
                        .ok_or_else(|| StoreError::NotFound("cursor message".to_string()))?,
                ),
                None => None,
            };
            let mut page: Vec<Message> = messages
                .iter()
                .filter(|m| &m.chat_id == chat_id)
                .filter(|m| cursor.is_none_or(|c| (m.created_at, m.id) < c))
                .cloned()
                .collect();
            page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            page.truncate(limit as usize);
            page.reverse();
            Ok(page)
        }

        async fn mark_messages_read(
            &self,
            chat_id: &ChatId,
            reader_id: &str,
        ) -> Result<u64, StoreError> {
            self.check()?;
            let now = Utc::now();
            let mut count = 0;
            for m in self.messages.lock().unwrap().iter_mut() {
                if &m.chat_id == chat_id && m.sender_id != reader_id && m.read_at.is_none() {
                    m.read_at = Some(now);
                    count += 1;
                }
            }
            Ok(count)
        }
    }

    fn service() -> ChatService<MemoryStore> {
        ChatService::new(MemoryStore::default(), PagingConfig::default())
    }

    #[tokio::test]
    async fn test_create_chat_is_idempotent_in_either_order() {
        let svc = service();
        let first = svc.create_chat("u1", "u2").await.unwrap();
        let again = svc.create_chat("u1", "u2").await.unwrap();
        let swapped = svc.create_chat("u2", "u1").await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.id, swapped.id);
        assert_eq!(svc.get_user_chats("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_chat_with_self_is_rejected() {
        let svc = service();
        let err = svc.create_chat("u1", "u1").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(svc.get_user_chats("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_chat_not_found() {
        let svc = service();
        let err = svc.get_chat(&ChatId::new()).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_chat_by_pair() {
        let svc = service();
        let chat = svc.create_chat("carol", "alice").await.unwrap();
        let found = svc.find_chat("alice", "carol").await.unwrap();
        assert_eq!(found.id, chat.id);
        assert!(matches!(
            svc.find_chat("alice", "bob").await.unwrap_err(),
            ChatError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_find_chat_store_unavailable() {
        let svc = ChatService::new(MemoryStore::offline(), PagingConfig::default());
        assert!(matches!(
            svc.find_chat("alice", "bob").await.unwrap_err(),
            ChatError::StoreUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_send_message_to_missing_chat() {
        let svc = service();
        let err = svc
            .send_message(&ChatId::new(), "u1", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_send_message_by_non_participant_persists_nothing() {
        let svc = service();
        let chat = svc.create_chat("u1", "u2").await.unwrap();
        let err = svc.send_message(&chat.id, "u3", "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::PermissionDenied { .. }));
        assert_eq!(svc.store().message_count(), 0);
    }

    #[tokio::test]
    async fn test_send_empty_message_is_rejected() {
        let svc = service();
        let chat = svc.create_chat("u1", "u2").await.unwrap();
        let err = svc.send_message(&chat.id, "u1", "").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert_eq!(svc.store().message_count(), 0);
    }

    #[tokio::test]
    async fn test_send_message_moves_chat_to_top() {
        let svc = service();
        let older = svc.create_chat("u1", "u2").await.unwrap();
        let newer = svc.create_chat("u1", "u3").await.unwrap();

        let chats = svc.get_user_chats("u1").await.unwrap();
        assert_eq!(chats[0].id, newer.id);

        svc.send_message(&older.id, "u2", "ping").await.unwrap();
        let chats = svc.get_user_chats("u1").await.unwrap();
        assert_eq!(chats[0].id, older.id);
        assert_eq!(chats[1].id, newer.id);
    }

    #[tokio::test]
    async fn test_get_chat_messages_clamps_limit() {
        let svc = ChatService::new(
            MemoryStore::default(),
            PagingConfig {
                default_limit: 2,
                max_limit: 3,
            },
        );
        let chat = svc.create_chat("u1", "u2").await.unwrap();
        for i in 0..5 {
            svc.send_message(&chat.id, "u1", &format!("m{i}"))
                .await
                .unwrap();
        }

        let default_page = svc
            .get_chat_messages(&chat.id, None, None, None)
            .await
            .unwrap();
        assert_eq!(default_page.len(), 2);

        let non_positive = svc
            .get_chat_messages(&chat.id, None, Some(-1), None)
            .await
            .unwrap();
        assert_eq!(non_positive.len(), 2);

        let capped = svc
            .get_chat_messages(&chat.id, None, Some(1000), None)
            .await
            .unwrap();
        assert_eq!(capped.len(), 3);
        let contents: Vec<&str> = capped.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_get_chat_messages_pages_backward() {
        let svc = service();
        let chat = svc.create_chat("u1", "u2").await.unwrap();
        let mut sent = Vec::new();
        for i in 0..7 {
            sent.push(
                svc.send_message(&chat.id, "u1", &format!("m{i}"))
                    .await
                    .unwrap(),
            );
        }

        let page = svc
            .get_chat_messages(&chat.id, None, Some(3), Some(&sent[5].id))
            .await
            .unwrap();
        let ids: Vec<MessageId> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![sent[2].id, sent[3].id, sent[4].id]);

        let older = svc
            .get_chat_messages(&chat.id, None, Some(3), Some(&page[0].id))
            .await
            .unwrap();
        let ids: Vec<MessageId> = older.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![sent[0].id, sent[1].id]);
    }

    #[tokio::test]
    async fn test_get_chat_messages_with_viewer_requires_participant() {
        let svc = service();
        let chat = svc.create_chat("u1", "u2").await.unwrap();
        svc.send_message(&chat.id, "u1", "hi").await.unwrap();

        let err = svc
            .get_chat_messages(&chat.id, Some("u3"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::PermissionDenied { .. }));

        let err = svc
            .get_chat_messages(&ChatId::new(), Some("u1"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));

        let page = svc
            .get_chat_messages(&chat.id, Some("u2"), None, None)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_messages_as_read_by_non_participant() {
        let svc = service();
        let chat = svc.create_chat("u1", "u2").await.unwrap();
        let err = svc.mark_messages_as_read(&chat.id, "u3").await.unwrap_err();
        assert!(matches!(err, ChatError::PermissionDenied { .. }));

        let err = svc
            .mark_messages_as_read(&ChatId::new(), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_two_user_scenario() {
        let svc = service();
        let chat = svc.create_chat("U1", "U2").await.unwrap();
        let m1 = svc.send_message(&chat.id, "U1", "hi").await.unwrap();
        let m2 = svc.send_message(&chat.id, "U2", "hello").await.unwrap();

        let page = svc
            .get_chat_messages(&chat.id, None, Some(50), None)
            .await
            .unwrap();
        let ids: Vec<MessageId> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![m1.id, m2.id]);

        assert_eq!(svc.mark_messages_as_read(&chat.id, "U1").await.unwrap(), 1);
        assert_eq!(svc.mark_messages_as_read(&chat.id, "U1").await.unwrap(), 0);

        let page = svc
            .get_chat_messages(&chat.id, None, None, None)
            .await
            .unwrap();
        assert!(!page[0].is_read(), "U1's own message stays unread");
        assert!(page[1].is_read());
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let svc = ChatService::new(MemoryStore::offline(), PagingConfig::default());
        assert!(matches!(
            svc.create_chat("u1", "u2").await.unwrap_err(),
            ChatError::StoreUnavailable(_)
        ));
        assert!(matches!(
            svc.send_message(&ChatId::new(), "u1", "hi").await.unwrap_err(),
            ChatError::StoreUnavailable(_)
        ));
        assert!(matches!(
            svc.get_user_chats("u1").await.unwrap_err(),
            ChatError::StoreUnavailable(_)
        ));
    }
}
