/**
 * DAILY PULSE AGENT - Point d'entrée du serveur
 *
 * RÔLE : Charge la config (.env + pulse.yaml + env), construit les clients
 * upstream (métriques, complétion, Bubble, sessions ChatKit) et sert l'API HTTP.
 *
 * ARCHITECTURE : une requête = un enchaînement séquentiel d'appels externes,
 * aucun état partagé hormis la config en lecture seule.
 */

mod config;
mod error;
mod http;
mod metrics;
mod models;
mod orchestrator;
mod publish;
mod session;
mod summary;
mod upstream;

#[cfg(test)]
mod test_support;

use crate::config::load_config;
use crate::http::AppState;
use crate::orchestrator::RequestOrchestrator;
use crate::session::ChatKitSessions;

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = load_config().await.context("failed to load configuration")?;
    info!(
        metrics = cfg.metrics.is_some(),
        bubble = cfg.bubble.is_some(),
        model = %cfg.completion.model,
        "[pulse] configuration loaded"
    );
    if cfg.completion.api_key.is_none() {
        warn!("[pulse] OPENAI_API_KEY not set, /agent/run will fail at the summary step");
    }
    if cfg.workflow_id.is_none() {
        warn!("[pulse] WORKFLOW_ID not set, /chatkit will fail");
    }

    // un seul client HTTP partagé, sans timeout global
    let client = reqwest::Client::builder()
        .user_agent(concat!("daily-pulse-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let sessions = ChatKitSessions::new(client.clone(), cfg.completion.clone(), cfg.workflow_id.clone());
    let orchestrator = RequestOrchestrator::from_config(&cfg, client);
    let app = http::build_router(AppState {
        orchestrator: Arc::new(orchestrator),
        sessions: Arc::new(sessions),
    });

    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    info!("[pulse] listening on http://{}", cfg.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
