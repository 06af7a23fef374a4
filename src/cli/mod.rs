use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8787")]
    pub server_addr: String,

    // --- Inference Provider Args ---
    /// API key for the Hugging Face inference API. The secondary provider is
    /// skipped entirely when this is empty.
    #[arg(long, env = "HF_API_KEY", default_value = "")]
    pub hf_api_key: String,

    /// Base URL for the Hugging Face inference API.
    #[arg(long, env = "HF_BASE_URL", default_value = "https://api-inference.huggingface.co")]
    pub hf_base_url: String,

    /// Comma-separated ladder of text generation models, tried in order.
    #[arg(
        long,
        env = "HF_TEXT_MODELS",
        default_value = "microsoft/DialoGPT-medium,gpt2,microsoft/DialoGPT-small"
    )]
    pub hf_text_models: String,

    /// Comma-separated ladder of text-to-image models, tried in order.
    #[arg(
        long,
        env = "HF_IMAGE_MODELS",
        default_value = "stabilityai/stable-diffusion-xl-base-1.0,runwayml/stable-diffusion-v1-5,CompVis/stable-diffusion-v1-4"
    )]
    pub hf_image_models: String,

    // --- Session Store Args ---
    /// Maximum number of conversation sessions kept in memory. The least
    /// recently used session is evicted once the cap is reached.
    #[arg(long, env = "SESSION_CAPACITY", default_value = "1024")]
    pub session_capacity: usize,

    /// Maximum number of messages retained per session.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "50")]
    pub history_limit: usize,

    // --- Streaming Args ---
    /// Base delay in milliseconds between streamed words. 0 disables pacing.
    #[arg(long, env = "STREAM_DELAY_MS", default_value = "30")]
    pub stream_delay_ms: u64,

    /// Additional random jitter in milliseconds added to each word delay.
    #[arg(long, env = "STREAM_JITTER_MS", default_value = "50")]
    pub stream_jitter_ms: u64,

    // --- Static UI Args ---
    /// Directory containing the chat UI assets.
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: String,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn text_model_ladder(&self) -> Vec<String> {
        split_model_list(&self.hf_text_models)
    }

    pub fn image_model_ladder(&self) -> Vec<String> {
        split_model_list(&self.hf_image_models)
    }
}

fn split_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_list_splits_and_trims() {
        let models = split_model_list(" gpt2 , microsoft/DialoGPT-small ,,");
        assert_eq!(models, vec!["gpt2", "microsoft/DialoGPT-small"]);
    }

    #[test]
    fn empty_model_list_is_empty() {
        assert!(split_model_list("").is_empty());
    }
}
