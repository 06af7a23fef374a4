pub mod api;

use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::agent::ChatAgent;
use crate::cli::Args;

pub struct Server {
    addr: String,
    agent: Arc<ChatAgent>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<ChatAgent>, args: Args) -> Self {
        Self { addr, agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::build_router(Arc::clone(&self.agent), &self.args.static_dir);

        if self.args.enable_tls {
            let (cert_path, key_path) = match (
                &self.args.tls_cert_path,
                &self.args.tls_key_path,
            ) {
                (Some(cert), Some(key)) => (cert, key),
                _ => {
                    error!("--enable-tls requires both --tls-cert-path and --tls-key-path");
                    return Err("TLS enabled without cert/key".into());
                }
            };

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            info!("HTTPS server listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("HTTP server listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
