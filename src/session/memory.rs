use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use std::error::Error;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

use crate::models::chat::{ ChatMessage, MessageKind, Role };
use super::{ preferences, ConversationContext, SessionStore };

/// In-memory session store with an LRU bound on the number of sessions.
/// Least recently touched conversations are dropped at capacity, and each
/// conversation keeps only its most recent `history_limit` messages.
pub struct MemorySessionStore {
    sessions: Mutex<LruCache<String, ConversationContext>>,
    history_limit: usize,
}

impl MemorySessionStore {
    pub fn new(capacity: usize, history_limit: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            history_limit,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn record_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        kind: MessageKind
    ) -> Result<ConversationContext, Box<dyn Error + Send + Sync>> {
        let mut sessions = self.sessions.lock().await;
        let context = sessions.get_or_insert_mut(session_id.to_string(), || {
            ConversationContext::new(session_id.to_string())
        });

        context.messages.push(ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now().timestamp(),
            kind,
        });
        if context.messages.len() > self.history_limit {
            let overflow = context.messages.len() - self.history_limit;
            context.messages.drain(..overflow);
        }
        context.stats.total_messages += 1;

        if role == Role::User {
            context.preferences = preferences::analyze(&context.messages);
        }

        Ok(context.clone())
    }

    async fn get_context(
        &self,
        session_id: &str
    ) -> Result<Option<ConversationContext>, Box<dyn Error + Send + Sync>> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn note_image_generated(
        &self,
        session_id: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(context) = sessions.get_mut(session_id) {
            context.stats.total_images += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ResponseStyle;

    #[tokio::test]
    async fn messages_append_in_display_order() {
        let store = MemorySessionStore::new(8, 50);
        store.record_message("s1", Role::User, "first", MessageKind::Text).await.unwrap();
        store.record_message("s1", Role::Assistant, "second", MessageKind::Text).await.unwrap();
        let context = store
            .record_message("s1", Role::User, "third", MessageKind::Text).await
            .unwrap();

        let contents: Vec<&str> = context.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(context.stats.total_messages, 3);
    }

    #[tokio::test]
    async fn history_is_truncated_to_limit() {
        let store = MemorySessionStore::new(8, 3);
        for i in 0..5 {
            store
                .record_message("s1", Role::User, &format!("msg{}", i), MessageKind::Text).await
                .unwrap();
        }

        let context = store.get_context("s1").await.unwrap().unwrap();
        let contents: Vec<&str> = context.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["msg2", "msg3", "msg4"]);
        // the counter keeps counting past the truncation window
        assert_eq!(context.stats.total_messages, 5);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted() {
        let store = MemorySessionStore::new(2, 50);
        store.record_message("a", Role::User, "hi", MessageKind::Text).await.unwrap();
        store.record_message("b", Role::User, "hi", MessageKind::Text).await.unwrap();
        // touch "a" so "b" becomes the eviction candidate
        store.get_context("a").await.unwrap();
        store.record_message("c", Role::User, "hi", MessageKind::Text).await.unwrap();

        assert!(store.get_context("a").await.unwrap().is_some());
        assert!(store.get_context("b").await.unwrap().is_none());
        assert!(store.get_context("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn user_messages_refresh_preferences() {
        let store = MemorySessionStore::new(8, 50);
        let context = store
            .record_message("s1", Role::User, "give me a detailed explain", MessageKind::Text).await
            .unwrap();
        assert_eq!(context.preferences.response_style, ResponseStyle::Detailed);
    }

    #[tokio::test]
    async fn image_counter_tracks_generations() {
        let store = MemorySessionStore::new(8, 50);
        store.record_message("s1", Role::User, "a cat", MessageKind::Image).await.unwrap();
        store.note_image_generated("s1").await.unwrap();
        store.note_image_generated("s1").await.unwrap();

        let context = store.get_context("s1").await.unwrap().unwrap();
        assert_eq!(context.stats.total_images, 2);
    }
}
