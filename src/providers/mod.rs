pub mod canned;
pub mod huggingface;
pub mod template;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::session::Preferences;

pub use self::canned::CannedProvider;
pub use self::huggingface::HuggingFaceProvider;
pub use self::template::TemplateProvider;

/// Replies at or below this many bytes are treated as a provider failure and
/// the chain moves on to the next tier.
pub const MIN_REPLY_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider '{0}' does not support image generation")]
    ImageUnsupported(&'static str),
    #[error("API key not configured for provider '{0}'")]
    MissingApiKey(&'static str),
    #[error("all models failed for provider '{0}'")]
    AllModelsFailed(&'static str),
    #[error("empty or trivial response from provider '{0}'")]
    EmptyResponse(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug)]
pub struct ImagePayload {
    pub image: String,
    pub message: String,
}

/// One tier of the fallback chain. Text and image generation are attempted
/// per-provider in chain order; the first substantial result wins.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        prompt: &str,
        preferences: &Preferences
    ) -> Result<String, ProviderError>;

    async fn text_to_image(&self, prompt: &str) -> Result<ImagePayload, ProviderError> {
        let _ = prompt;
        Err(ProviderError::ImageUnsupported(self.name()))
    }
}

pub fn is_substantial(reply: &str) -> bool {
    reply.trim().len() > MIN_REPLY_LEN
}

/// Assembles the ordered provider chain: template first, the Hugging Face
/// inference API when a key is configured, and the canned tier last. The
/// canned tier never fails, so the chain as a whole cannot come up empty.
pub fn build_provider_chain(args: &Args) -> Vec<Arc<dyn ReplyProvider>> {
    let mut chain: Vec<Arc<dyn ReplyProvider>> = Vec::new();

    chain.push(Arc::new(TemplateProvider::new()));

    if args.hf_api_key.is_empty() {
        info!("HF_API_KEY not set; Hugging Face fallback tier disabled");
    } else {
        chain.push(
            Arc::new(
                HuggingFaceProvider::new(
                    args.hf_api_key.clone(),
                    args.hf_base_url.clone(),
                    args.text_model_ladder(),
                    args.image_model_ladder()
                )
            )
        );
    }

    chain.push(Arc::new(CannedProvider::new()));

    info!(
        "Provider chain: [{}]",
        chain
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn substantial_requires_more_than_min_len() {
        assert!(!is_substantial("short"));
        assert!(!is_substantial("   padded   "));
        assert!(is_substantial("this is a real reply"));
    }

    #[test]
    fn chain_skips_huggingface_without_key() {
        let args = Args::parse_from(["chat-relay", "--hf-api-key", ""]);
        let chain = build_provider_chain(&args);
        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["template", "canned"]);
    }

    #[test]
    fn chain_includes_huggingface_with_key() {
        let args = Args::parse_from(["chat-relay", "--hf-api-key", "hf_test"]);
        let chain = build_provider_chain(&args);
        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["template", "huggingface", "canned"]);
    }
}
