use std::collections::BTreeSet;

use crate::models::chat::{ ChatMessage, Role };
use super::{ Language, Preferences, ResponseStyle };

/// Number of trailing user messages the analysis looks at.
const ANALYSIS_WINDOW: usize = 5;

/// Infers language, response style, and topics of interest from the most
/// recent user messages. Runs after every user message; the result replaces
/// the previously stored preferences wholesale.
pub fn analyze(messages: &[ChatMessage]) -> Preferences {
    let recent: Vec<String> = messages
        .iter()
        .rev()
        .filter(|msg| msg.role == Role::User)
        .take(ANALYSIS_WINDOW)
        .map(|msg| msg.content.to_lowercase())
        .collect();

    let mut preferences = Preferences::default();

    if recent.iter().any(|content| contains_cyrillic(content)) {
        preferences.language = Language::Ru;
    } else if recent.iter().any(|content| contains_spanish_diacritics(content)) {
        preferences.language = Language::Es;
    }

    if recent.iter().any(|c| c.contains("brief") || c.contains("short")) {
        preferences.response_style = ResponseStyle::Concise;
    } else if recent.iter().any(|c| c.contains("detailed") || c.contains("explain")) {
        preferences.response_style = ResponseStyle::Detailed;
    } else if recent.iter().any(|c| c.contains("professional") || c.contains("business")) {
        preferences.response_style = ResponseStyle::Professional;
    }

    let mut topics = BTreeSet::new();
    for content in &recent {
        if content.contains("programming") || content.contains("code") {
            topics.insert("programming");
        }
        if content.contains("ai") || content.contains("machine learning") {
            topics.insert("ai");
        }
        if content.contains("database") || content.contains("sql") {
            topics.insert("databases");
        }
        if content.contains("design") || content.contains("ui") {
            topics.insert("design");
        }
        if content.contains("business") || content.contains("startup") {
            topics.insert("business");
        }
    }
    preferences.topics = topics.into_iter().map(String::from).collect();

    preferences
}

fn contains_cyrillic(content: &str) -> bool {
    content.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

fn contains_spanish_diacritics(content: &str) -> bool {
    content.chars().any(|c| "ñáéíóúü".contains(c))
}
