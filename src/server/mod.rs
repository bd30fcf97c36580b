//! Web server module: browser UI and JSON API

pub mod http;

use anyhow::{Result, Context};
use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    /// Connection pool reused by every consultation's LLM client
    pub http_client: Client,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http_client: Client::new(),
        }
    }
}

/// TLS material for HTTPS mode
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert: String,
    pub key: String,
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_page))
        .route("/api/status", get(http::status_handler))
        .route("/api/defaults", get(http::defaults_handler))
        .route("/api/run_consultation", post(http::run_consultation_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(config: Config, host: &str, port: u16, tls: Option<TlsFiles>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let provider = config.llm.provider;
    let model = config.llm.model.clone();
    let app = router(ServerState::new(config));

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Clinical Panel Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("✓ Server binding to: {}", addr);
    println!("✓ Model: {} via {}", model, provider);
    if tls.is_some() {
        println!("✓ HTTPS enabled");
    } else {
        println!("⚠ HTTPS disabled");
    }
    println!();
    println!("🚀 Open http{}://{} in your browser", if tls.is_some() { "s" } else { "" }, addr);
    println!();
    info!("Listening on {}", addr);

    if let Some(tls) = tls {
        let cert_data = tokio::fs::read(&tls.cert).await
            .context("Failed to read certificate file")?;
        let key_data = tokio::fs::read(&tls.key).await
            .context("Failed to read key file")?;

        let rustls_config = axum_server::tls_rustls::RustlsConfig::from_pem(cert_data, key_data).await
            .context("Failed to load TLS certificate")?;
        axum_server::bind_rustls(addr, rustls_config).serve(app.into_make_service()).await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Handler for the index page
async fn index_page() -> Html<&'static str> {
    Html(include_str!("index.html"))
}
