use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use globetrotter::config::{
    resolve_api_key, AppConfig, ClientConfig, GenerationConfig, DEFAULT_BASE_URL,
    DEFAULT_BIND_ADDR, DEFAULT_MODEL,
};
use globetrotter::{router, AppState, GeminiClient};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "globetrotter-server")]
struct Args {
    #[arg(long, env = "GLOBETROTTER_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Falls back to GEMINI_API_KEY, GOOGLE_AI_API_KEY, then API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long, env = "GLOBETROTTER_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "GLOBETROTTER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "GLOBETROTTER_TIMEOUT_MS", default_value_t = 60_000)]
    timeout_ms: u64,

    #[arg(long, env = "GLOBETROTTER_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> AppConfig {
        AppConfig {
            bind_addr: self.bind,
            client: ClientConfig {
                base_url: self.base_url,
                api_key: resolve_api_key(self.api_key),
                timeout_ms: self.timeout_ms,
            },
            generation: GenerationConfig {
                model: self.model,
                ..GenerationConfig::default()
            },
            log_json: self.log_json,
        }
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config();
    init_tracing(config.log_json);

    if config.client.api_key.is_none() {
        warn!("no API key configured; generation requests will fail until one is set");
    }

    let client = GeminiClient::new(config.client.clone()).context("building model client")?;
    let app = router(AppState::new(Arc::new(client), config.generation.clone()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, model = %config.generation.model, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server crashed")?;

    info!("server stopped");
    Ok(())
}
