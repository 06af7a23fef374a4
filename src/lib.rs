pub mod agent;
pub mod cli;
pub mod models;
pub mod providers;
pub mod server;
pub mod session;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HF Base URL: {}", args.hf_base_url);
    info!("HF API Key Set: {}", !args.hf_api_key.is_empty());
    info!("Text Models: {}", args.hf_text_models);
    info!("Image Models: {}", args.hf_image_models);
    info!("Session Capacity: {}", args.session_capacity);
    info!("History Limit: {}", args.history_limit);
    info!("Stream Delay: {}ms (+{}ms jitter)", args.stream_delay_ms, args.stream_jitter_ms);
    info!("Static Dir: {}", args.static_dir);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::new(&args));
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
