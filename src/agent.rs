use futures::Stream;
use log::{ info, warn };
use rand::Rng;
use std::error::Error;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::cli::Args;
use crate::models::api::ImageResponse;
use crate::models::chat::{ MessageKind, Role };
use crate::providers::{ build_provider_chain, is_substantial, ReplyProvider };
use crate::session::{ initialize_session_store, ConversationContext, SessionStore };

/// Emitted as a single chunk when every tier of the chain has failed.
const APOLOGY: &str =
    "I'm having trouble connecting right now. Let me give you a helpful response instead: That's an interesting question! I'd be happy to help you with that.";

pub type ChunkStream = Pin<
    Box<dyn Stream<Item = Result<String, Box<dyn Error + Send + Sync>>> + Send>
>;

/// Walks the ordered provider chain and manages per-session context. Cloning
/// is cheap; all state is behind `Arc`s.
#[derive(Clone)]
pub struct ChatAgent {
    providers: Vec<Arc<dyn ReplyProvider>>,
    sessions: Arc<dyn SessionStore>,
    stream_delay_ms: u64,
    stream_jitter_ms: u64,
}

impl ChatAgent {
    pub fn new(args: &Args) -> Self {
        Self {
            providers: build_provider_chain(args),
            sessions: initialize_session_store(args),
            stream_delay_ms: args.stream_delay_ms,
            stream_jitter_ms: args.stream_jitter_ms,
        }
    }

    pub fn with_parts(
        providers: Vec<Arc<dyn ReplyProvider>>,
        sessions: Arc<dyn SessionStore>,
        stream_delay_ms: u64,
        stream_jitter_ms: u64
    ) -> Self {
        Self {
            providers,
            sessions,
            stream_delay_ms,
            stream_jitter_ms,
        }
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// First substantial reply in chain order wins. Trivial replies count as
    /// tier failures, same as errors.
    async fn generate_reply(&self, message: &str, context: &ConversationContext) -> String {
        for provider in &self.providers {
            match provider.complete(message, &context.preferences).await {
                Ok(reply) if is_substantial(&reply) => {
                    info!("Provider '{}' produced the reply", provider.name());
                    return reply;
                }
                Ok(_) => {
                    warn!("Provider '{}' returned a trivial reply, falling through", provider.name());
                }
                Err(e) => {
                    warn!("Provider '{}' failed: {}, falling through", provider.name(), e);
                }
            }
        }
        warn!("All providers failed, using apology response");
        APOLOGY.to_string()
    }

    /// Records the user message, produces one assistant reply, records it,
    /// and returns it.
    pub async fn process_message(
        &self,
        session_id: &str,
        message: &str
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let context = self.sessions.record_message(
            session_id,
            Role::User,
            message,
            MessageKind::Text
        ).await?;

        let reply = self.generate_reply(message, &context).await;

        self.sessions.record_message(
            session_id,
            Role::Assistant,
            &reply,
            MessageKind::Text
        ).await?;

        Ok(reply)
    }

    /// Same reply as `process_message`, delivered word by word with a small
    /// randomized delay between chunks. Tokens are split on single spaces so
    /// newlines embedded in a token survive to the client; concatenating the
    /// chunks yields the full reply with a trailing space. Dropping the
    /// receiver abandons the in-flight generation.
    pub async fn stream_message(&self, session_id: &str, message: &str) -> ChunkStream {
        let (tx, rx) = mpsc::channel(32);
        let agent = self.clone();
        let session_id = session_id.to_string();
        let message = message.to_string();

        tokio::spawn(async move {
            let reply = match agent.process_message(&session_id, &message).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Message processing failed for session {}: {}", session_id, e);
                    APOLOGY.to_string()
                }
            };

            for word in reply.split(' ').filter(|w| !w.trim().is_empty()) {
                if tx.send(Ok(format!("{} ", word))).await.is_err() {
                    return;
                }
                agent.pace().await;
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    /// Collects the streamed chunks back into one string, for callers that
    /// did not ask for an event stream.
    pub async fn collect_message(
        &self,
        session_id: &str,
        message: &str
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        use futures::StreamExt;

        let mut stream = self.stream_message(session_id, message).await;
        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            full.push_str(&chunk?);
        }
        Ok(full)
    }

    /// Image fallback chain: first provider that can produce an image wins,
    /// ending at the placeholder tier which always succeeds.
    pub async fn generate_image(
        &self,
        session_id: &str,
        prompt: &str
    ) -> Result<ImageResponse, Box<dyn Error + Send + Sync>> {
        self.sessions.record_message(session_id, Role::User, prompt, MessageKind::Image).await?;

        for provider in &self.providers {
            match provider.text_to_image(prompt).await {
                Ok(payload) => {
                    info!("Provider '{}' produced the image", provider.name());
                    self.sessions.note_image_generated(session_id).await?;
                    self.sessions.record_message(
                        session_id,
                        Role::Assistant,
                        &payload.message,
                        MessageKind::Image
                    ).await?;
                    return Ok(ImageResponse::new(payload.image, payload.message));
                }
                Err(e) => {
                    warn!("Provider '{}' image path failed: {}, falling through", provider.name(), e);
                }
            }
        }
        Err("no provider could produce an image".into())
    }

    async fn pace(&self) {
        if self.stream_delay_ms == 0 && self.stream_jitter_ms == 0 {
            return;
        }
        let jitter = if self.stream_jitter_ms > 0 {
            rand::rng().random_range(0..self.stream_jitter_ms)
        } else {
            0
        };
        tokio::time::sleep(Duration::from_millis(self.stream_delay_ms + jitter)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::providers::{ CannedProvider, ProviderError, TemplateProvider };
    use crate::session::{ MemorySessionStore, Preferences };

    struct FixedProvider {
        reply: &'static str,
    }

    #[async_trait]
    impl ReplyProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn complete(
            &self,
            _prompt: &str,
            _preferences: &Preferences
        ) -> Result<String, ProviderError> {
            Ok(self.reply.to_string())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ReplyProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn complete(
            &self,
            _prompt: &str,
            _preferences: &Preferences
        ) -> Result<String, ProviderError> {
            Err(ProviderError::AllModelsFailed("failing"))
        }
    }

    fn agent_with(providers: Vec<Arc<dyn ReplyProvider>>) -> ChatAgent {
        ChatAgent::with_parts(providers, Arc::new(MemorySessionStore::new(16, 50)), 0, 0)
    }

    #[tokio::test]
    async fn first_successful_provider_wins() {
        let agent = agent_with(
            vec![
                Arc::new(FixedProvider { reply: "the primary reply wins here" }),
                Arc::new(CannedProvider::new())
            ]
        );
        let reply = agent.process_message("s1", "anything").await.unwrap();
        assert_eq!(reply, "the primary reply wins here");
    }

    #[tokio::test]
    async fn trivial_reply_falls_through_to_next_tier() {
        let agent = agent_with(
            vec![
                Arc::new(FixedProvider { reply: "nope" }),
                Arc::new(FixedProvider { reply: "the second tier answered this one" })
            ]
        );
        let reply = agent.process_message("s1", "anything").await.unwrap();
        assert_eq!(reply, "the second tier answered this one");
    }

    #[tokio::test]
    async fn erroring_provider_falls_through() {
        let agent = agent_with(
            vec![Arc::new(FailingProvider), Arc::new(CannedProvider::new())]
        );
        let reply = agent.process_message("s1", "tell me a joke").await.unwrap();
        assert!(reply.contains("dark mode"));
    }

    #[tokio::test]
    async fn exhausted_chain_yields_apology() {
        let agent = agent_with(vec![Arc::new(FailingProvider)]);
        let reply = agent.process_message("s1", "anything").await.unwrap();
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn streamed_chunks_concatenate_to_the_reply() {
        use futures::StreamExt;

        let agent = agent_with(
            vec![Arc::new(FixedProvider { reply: "alpha beta gamma delta" })]
        );
        let mut stream = agent.stream_message("s1", "anything").await;
        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            chunks.push(chunk.unwrap());
        }

        assert_eq!(chunks, vec!["alpha ", "beta ", "gamma ", "delta "]);
        assert_eq!(chunks.concat(), "alpha beta gamma delta ");
    }

    #[tokio::test]
    async fn paragraph_breaks_survive_streaming() {
        use futures::StreamExt;

        let agent = agent_with(
            vec![Arc::new(FixedProvider {
                reply: "Main reply body here.\n\n(I can also respond in Spanish if you prefer.)",
            })]
        );
        let mut stream = agent.stream_message("s1", "anything").await;
        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            full.push_str(&chunk.unwrap());
        }

        assert_eq!(
            full,
            "Main reply body here.\n\n(I can also respond in Spanish if you prefer.) "
        );
    }

    #[tokio::test]
    async fn collect_matches_streamed_concatenation() {
        let providers: Vec<Arc<dyn ReplyProvider>> = vec![
            Arc::new(FixedProvider { reply: "one two three four five" })
        ];
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(16, 50));
        let agent = ChatAgent::with_parts(providers, store, 0, 0);

        let collected = agent.collect_message("s1", "anything").await.unwrap();
        assert_eq!(collected, "one two three four five ");
    }

    #[tokio::test]
    async fn conversation_records_both_sides() {
        let agent = agent_with(vec![Arc::new(TemplateProvider::new())]);
        agent.process_message("s1", "hello there").await.unwrap();

        let context = agent.session_store().get_context("s1").await.unwrap().unwrap();
        assert_eq!(context.messages.len(), 2);
        assert_eq!(context.messages[0].role, Role::User);
        assert_eq!(context.messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn image_chain_ends_at_placeholder() {
        let agent = agent_with(
            vec![Arc::new(TemplateProvider::new()), Arc::new(CannedProvider::new())]
        );
        let response = agent.generate_image("s1", "a red fox").await.unwrap();
        assert_eq!(response.kind, "image");
        assert!(response.image.contains("via.placeholder.com"));

        let context = agent.session_store().get_context("s1").await.unwrap().unwrap();
        assert_eq!(context.stats.total_images, 1);
    }
}
