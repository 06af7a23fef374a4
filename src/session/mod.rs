mod memory;
pub mod preferences;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use serde::{ Serialize, Deserialize };

use crate::cli::Args;
use crate::models::chat::{ ChatMessage, MessageKind, Role };

pub use memory::MemorySessionStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    Concise,
    Detailed,
    #[default]
    Casual,
    Professional,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub language: Language,
    pub response_style: ResponseStyle,
    pub topics: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
    Es,
}

impl Language {
    pub fn display_name(&self) -> Option<&'static str> {
        match self {
            Language::En => None,
            Language::Ru => Some("Russian"),
            Language::Es => Some("Spanish"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_messages: u64,
    pub total_images: u64,
}

/// Per-conversation accumulator: ordered messages plus inferred preferences.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub preferences: Preferences,
    pub stats: SessionStats,
}

impl ConversationContext {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            preferences: Preferences::default(),
            stats: SessionStats::default(),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Appends a message and, for user messages, re-runs preference analysis.
    /// Returns a snapshot of the context after the update.
    async fn record_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        kind: MessageKind
    ) -> Result<ConversationContext, Box<dyn Error + Send + Sync>>;

    async fn get_context(
        &self,
        session_id: &str
    ) -> Result<Option<ConversationContext>, Box<dyn Error + Send + Sync>>;

    async fn note_image_generated(
        &self,
        session_id: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub fn initialize_session_store(args: &Args) -> Arc<dyn SessionStore> {
    info!(
        "Session store: in-memory LRU, capacity={}, history_limit={}",
        args.session_capacity,
        args.history_limit
    );
    Arc::new(MemorySessionStore::new(args.session_capacity, args.history_limit))
}
