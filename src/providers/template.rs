use async_trait::async_trait;
use rand::prelude::IndexedRandom;

use crate::session::{ Preferences, ResponseStyle };
use super::{ ProviderError, ReplyProvider };

/// Primary tier: keyword-routed templated replies shaped by the inferred
/// response style. Stands in for a first-party model endpoint; image requests
/// are unsupported so the chain falls through to the next tier.
pub struct TemplateProvider;

impl TemplateProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemplateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyProvider for TemplateProvider {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn complete(
        &self,
        prompt: &str,
        preferences: &Preferences
    ) -> Result<String, ProviderError> {
        let lower = prompt.to_lowercase();
        let style = preferences.response_style;

        let mut reply = if lower.contains("hello") || lower.contains("hi") {
            greeting_reply(style, prompt)
        } else if lower.contains("how are you") {
            format!(
                "I'm doing wonderfully, thank you for asking! I'm here and ready to help you with \"{}\". How can I assist you today?",
                prompt
            )
        } else if lower.contains("weather") {
            "I can't check real-time weather, but I'd be happy to discuss weather patterns, climate science, or help you plan activities based on typical seasonal conditions. What specifically about weather interests you?".to_string()
        } else if lower.contains("joke") || lower.contains("funny") {
            "Here's a tech joke for you: Why do programmers prefer dark mode? Because light attracts bugs! What else would you like to chat about?".to_string()
        } else if lower.contains("help") {
            format!(
                "I'm here to help! I can assist with questions, have conversations, generate images, or help you with various tasks. Your message \"{}\" shows you're looking for assistance - what specific help do you need?",
                prompt
            )
        } else if lower.contains("name") {
            "I'm your AI assistant, created to help you with various tasks and conversations. I noticed you asked about names - what would you like to know?".to_string()
        } else if lower.contains("time") {
            "I can't tell you the exact time, but I can help you with time management, scheduling tips, or discuss concepts related to time and productivity. What time-related topic interests you?".to_string()
        } else if lower.contains("math") || lower.contains("calculate") {
            format!(
                "I can help you with mathematical concepts, problem-solving strategies, and explain various mathematical topics. Your question \"{}\" suggests you're interested in math - what specific area would you like to explore?",
                prompt
            )
        } else if lower.contains("programming") || lower.contains("code") {
            programming_reply(style, prompt)
        } else if lower.contains("ai") || lower.contains("artificial intelligence") {
            ai_reply(style, prompt)
        } else if lower.contains("database") || lower.contains("sql") {
            database_reply(style, prompt)
        } else {
            generic_reply(style, prompt)
        };

        if let Some(language) = preferences.language.display_name() {
            reply.push_str(&format!("\n\n(I can also respond in {} if you prefer.)", language));
        }
        if !preferences.topics.is_empty() {
            reply.push_str(
                &format!(
                    "\n\nI notice you're interested in {}. Feel free to ask me anything about these topics!",
                    preferences.topics.join(", ")
                )
            );
        }

        Ok(reply)
    }
}

fn greeting_reply(style: ResponseStyle, prompt: &str) -> String {
    match style {
        ResponseStyle::Concise => "Hi! How can I help?".to_string(),
        ResponseStyle::Detailed =>
            "Hello there! I'm your AI assistant, ready to help you with various tasks. I can assist with programming, AI discussions, database design, and much more. What would you like to explore today?".to_string(),
        ResponseStyle::Casual =>
            format!(
                "Hello there! It's great to meet you. I'm excited to help you with \"{}\". What would you like to explore or learn about today?",
                prompt
            ),
        ResponseStyle::Professional =>
            "Good day. I'm your AI assistant, ready to provide professional assistance with your inquiries. How may I help you today?".to_string(),
    }
}

fn programming_reply(style: ResponseStyle, prompt: &str) -> String {
    match style {
        ResponseStyle::Concise => "I can help with programming. What do you need?".to_string(),
        ResponseStyle::Detailed =>
            "I'd love to help with programming! I can explain concepts, help debug issues, suggest solutions, or discuss best practices. Whether you're working with JavaScript, Python, Rust, or any other language, I'm here to assist. What specific programming topic would you like to discuss?".to_string(),
        ResponseStyle::Casual =>
            format!(
                "I'd love to help with programming! I can explain concepts, help debug issues, suggest solutions, or discuss best practices. Your message \"{}\" shows programming interest - what would you like to learn about?",
                prompt
            ),
        ResponseStyle::Professional =>
            "I'm well-versed in programming and software development. I can provide technical guidance, code review suggestions, and best practice recommendations. What programming challenge are you facing?".to_string(),
    }
}

fn ai_reply(style: ResponseStyle, prompt: &str) -> String {
    match style {
        ResponseStyle::Concise => "AI is fascinating. What would you like to know?".to_string(),
        ResponseStyle::Detailed =>
            "Artificial Intelligence is absolutely fascinating! I can discuss machine learning algorithms, neural network architectures, AI applications in various industries, or help you understand how AI systems work. From basic concepts to advanced implementations, I'm here to guide you. What specific AI topic interests you?".to_string(),
        ResponseStyle::Casual =>
            format!(
                "Artificial Intelligence is fascinating! I can discuss machine learning, neural networks, AI applications, or help you understand how AI systems work. Your question \"{}\" is great - what specific AI topic interests you?",
                prompt
            ),
        ResponseStyle::Professional =>
            "I have extensive knowledge of artificial intelligence and machine learning. I can assist with technical implementations, algorithm selection, and industry applications. What AI-related question do you have?".to_string(),
    }
}

fn database_reply(style: ResponseStyle, prompt: &str) -> String {
    match style {
        ResponseStyle::Concise => "Databases are my thing. Need help with one?".to_string(),
        ResponseStyle::Detailed =>
            "Databases are a great topic! I can help you with schema design, query optimization, indexing strategies, choosing between relational and document stores, and much more. What would you like to know?".to_string(),
        ResponseStyle::Casual =>
            format!(
                "Databases are great! Your interest in \"{}\" shows you're exploring backend development. I can help with schema design, queries, or picking the right store. What would you like to know?",
                prompt
            ),
        ResponseStyle::Professional =>
            "I'm familiar with database architecture and operations. I can help with schema design, query development, security implementation, and scalability planning. What specific aspect would you like to discuss?".to_string(),
    }
}

fn generic_reply(style: ResponseStyle, prompt: &str) -> String {
    match style {
        ResponseStyle::Concise => format!("I can help with \"{}\". What do you need?", prompt),
        ResponseStyle::Detailed =>
            format!(
                "That's an interesting topic: \"{}\". I'd be happy to discuss this with you and provide comprehensive information. What specific aspects would you like to explore?",
                prompt
            ),
        ResponseStyle::Professional =>
            format!(
                "I understand your interest in \"{}\". This is a topic I can provide professional insights on. What specific information are you seeking?",
                prompt
            ),
        ResponseStyle::Casual => {
            // pick a focus word from the prompt so repeated questions vary
            let focus_words: Vec<&str> = prompt
                .split(' ')
                .filter(|word| word.len() > 3)
                .collect();
            let mut rng = rand::rng();
            let focus = focus_words.choose(&mut rng).copied().unwrap_or(prompt);

            let variants = [
                format!(
                    "That's a fascinating topic: \"{}\". I can see you're interested in {} - what specific aspects would you like to explore?",
                    prompt,
                    focus
                ),
                format!(
                    "I appreciate you asking about \"{}\". This is something I can definitely help you with. Let me share some insights on {} and related concepts.",
                    prompt,
                    focus
                ),
                format!(
                    "Great question about \"{}\"! I'd be happy to discuss this with you and provide helpful information. What would you like to know specifically about {}?",
                    prompt,
                    focus
                ),
                format!(
                    "I understand you're asking about \"{}\". This is a great question that deserves a thoughtful response. Let me share some insights on this topic, particularly around {}.",
                    prompt,
                    focus
                ),
            ];
            variants
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| variants[0].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Language;

    fn prefs(style: ResponseStyle) -> Preferences {
        Preferences {
            language: Language::En,
            response_style: style,
            topics: Vec::new(),
        }
    }

    #[tokio::test]
    async fn greeting_routes_by_keyword() {
        let provider = TemplateProvider::new();
        let reply = provider
            .complete("hello there", &prefs(ResponseStyle::Concise)).await
            .unwrap();
        assert_eq!(reply, "Hi! How can I help?");
    }

    #[tokio::test]
    async fn generic_reply_quotes_the_prompt() {
        let provider = TemplateProvider::new();
        let reply = provider
            .complete("quantum entanglement basics", &prefs(ResponseStyle::Detailed)).await
            .unwrap();
        assert!(reply.contains("\"quantum entanglement basics\""));
    }

    #[tokio::test]
    async fn multilingual_note_appended_for_non_english() {
        let provider = TemplateProvider::new();
        let preferences = Preferences {
            language: Language::Es,
            response_style: ResponseStyle::Concise,
            topics: Vec::new(),
        };
        let reply = provider.complete("hola, hello", &preferences).await.unwrap();
        assert!(reply.contains("I can also respond in Spanish"));
    }

    #[tokio::test]
    async fn topic_note_lists_interests() {
        let provider = TemplateProvider::new();
        let preferences = Preferences {
            language: Language::En,
            response_style: ResponseStyle::Casual,
            topics: vec!["ai".to_string(), "programming".to_string()],
        };
        let reply = provider.complete("hello", &preferences).await.unwrap();
        assert!(reply.contains("interested in ai, programming"));
    }

    #[tokio::test]
    async fn images_are_unsupported() {
        let provider = TemplateProvider::new();
        let err = provider.text_to_image("a cat").await.unwrap_err();
        assert!(matches!(err, ProviderError::ImageUnsupported("template")));
    }
}
