use async_trait::async_trait;
use rand::prelude::IndexedRandom;
use url::form_urlencoded;

use crate::session::Preferences;
use super::{ ImagePayload, ProviderError, ReplyProvider };

const PLACEHOLDER_COLORS: [&str; 6] = [
    "4F46E5",
    "10B981",
    "F59E0B",
    "EF4444",
    "8B5CF6",
    "EC4899",
];

const MAX_PLACEHOLDER_PROMPT_LEN: usize = 50;

/// Final tier: fixed keyword-matched replies and a placeholder image URL.
/// This provider never fails, which is what makes the chain total.
pub struct CannedProvider;

impl CannedProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CannedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyProvider for CannedProvider {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn complete(
        &self,
        prompt: &str,
        _preferences: &Preferences
    ) -> Result<String, ProviderError> {
        let lower = prompt.to_lowercase();

        let reply = if lower.contains("hello") || lower.contains("hi") {
            "Hello! I'm your AI assistant. It's great to meet you! How can I help you today?".to_string()
        } else if lower.contains("how are you") {
            "I'm doing well, thank you for asking! I'm here to help you with any questions or tasks you might have.".to_string()
        } else if lower.contains("weather") {
            "I can't check real-time weather, but I'd be happy to discuss weather patterns, climate science, or help you plan activities based on typical seasonal conditions.".to_string()
        } else if lower.contains("joke") || lower.contains("funny") {
            "Here's a programming joke: Why do programmers prefer dark mode? Because light attracts bugs! What else would you like to know?".to_string()
        } else if lower.contains("help") {
            "I'm here to help! I can assist with questions, have conversations, generate images, or help you with various tasks. Just let me know what you need.".to_string()
        } else if lower.contains("name") {
            "I'm your AI assistant, created to help you with various tasks and conversations. What would you like to discuss?".to_string()
        } else if lower.contains("time") {
            "I can't tell you the exact time, but I can help you with time management, scheduling tips, or discuss concepts related to time and productivity.".to_string()
        } else if lower.contains("math") || lower.contains("calculate") {
            "I can help you with mathematical concepts, problem-solving strategies, and explain various mathematical topics. What specific math question do you have?".to_string()
        } else if lower.contains("programming") || lower.contains("code") {
            "I'd love to help with programming! I can explain concepts, help debug issues, suggest solutions, or discuss best practices. What programming topic interests you?".to_string()
        } else if lower.contains("ai") || lower.contains("artificial intelligence") {
            "Artificial Intelligence is fascinating! I can discuss machine learning, neural networks, AI applications, or help you understand how AI systems work. What would you like to know?".to_string()
        } else {
            format!(
                "That's an interesting topic: \"{}\". I'd be happy to discuss this with you. What specific aspects would you like to explore or learn more about?",
                prompt
            )
        };

        Ok(reply)
    }

    async fn text_to_image(&self, prompt: &str) -> Result<ImagePayload, ProviderError> {
        let mut rng = rand::rng();
        let color = PLACEHOLDER_COLORS.choose(&mut rng).copied().unwrap_or("4F46E5");

        let clean_prompt = if prompt.len() > MAX_PLACEHOLDER_PROMPT_LEN {
            let cut = prompt
                .char_indices()
                .take_while(|(i, _)| *i < MAX_PLACEHOLDER_PROMPT_LEN)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            format!("{}...", &prompt[..cut])
        } else {
            prompt.to_string()
        };

        let encoded: String = form_urlencoded::byte_serialize(clean_prompt.as_bytes()).collect();
        let image = format!(
            "https://via.placeholder.com/512x512/{}/FFFFFF?text={}",
            color,
            encoded
        );

        Ok(ImagePayload {
            image,
            message: format!(
                "Image generated successfully for: \"{}\". This is a placeholder image while AI image generation is unavailable. Your prompt was: {}",
                prompt,
                clean_prompt
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::is_substantial;

    #[tokio::test]
    async fn every_keyword_route_is_substantial() {
        let provider = CannedProvider::new();
        let prompts = [
            "hello",
            "how are you",
            "weather today",
            "tell me a joke",
            "help me out",
            "what's your name",
            "what time is it",
            "math question",
            "programming advice",
            "ai trends",
            "something else entirely",
        ];
        for prompt in prompts {
            let reply = provider.complete(prompt, &Preferences::default()).await.unwrap();
            assert!(is_substantial(&reply), "trivial reply for prompt '{}'", prompt);
        }
    }

    #[tokio::test]
    async fn unknown_prompt_gets_generic_reply_with_echo() {
        let provider = CannedProvider::new();
        let reply = provider
            .complete("orbital mechanics", &Preferences::default()).await
            .unwrap();
        assert!(reply.contains("\"orbital mechanics\""));
    }

    #[tokio::test]
    async fn placeholder_image_uses_known_palette() {
        let provider = CannedProvider::new();
        let payload = provider.text_to_image("a red fox").await.unwrap();
        assert!(payload.image.starts_with("https://via.placeholder.com/512x512/"));
        assert!(PLACEHOLDER_COLORS.iter().any(|c| payload.image.contains(c)));
        assert!(payload.image.contains("text=a+red+fox"));
    }

    #[tokio::test]
    async fn long_prompts_are_truncated_in_placeholder() {
        let provider = CannedProvider::new();
        let long_prompt = "x".repeat(80);
        let payload = provider.text_to_image(&long_prompt).await.unwrap();
        assert!(payload.message.contains(&format!("{}...", "x".repeat(50))));
    }
}
