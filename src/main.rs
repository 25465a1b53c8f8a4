// This is the entry point of the Classroom auto-grader add-on.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Google and Gemini APIs, session storage)
// - `web/` = HTTP adapters (routes, templates, cookies)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Build the router and serve it

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

use crate::config::{AppConfig, ATTACHMENT_TITLE};
use crate::core::auth::{SessionManager, SessionStore, TokenExchanger};
use crate::core::classroom::{AttachmentService, ClassroomApi};
use crate::core::grading::{AiConfig, AiProvider, GradingService};
use crate::infra::ai::GeminiClient;
use crate::infra::google::{ClassroomClient, GoogleTokenClient};
use crate::infra::sessions::InMemorySessionStore;
use crate::web::AppState;
use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "classroom_autograder=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is not set; session cookies are signed with the development key");
    }
    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; /api/grade will fail until it is configured");
    }

    // Initialize the OAuth session flow
    let token_client = GoogleTokenClient::new().context("Failed to build token client")?;
    let sessions = SessionManager::new(
        config.oauth.clone(),
        Box::new(token_client) as Box<dyn TokenExchanger>,
        Box::new(InMemorySessionStore::new()) as Box<dyn SessionStore>,
    );

    // Initialize grading
    let gemini = GeminiClient::new(config.gemini.api_key.clone())
        .context("Failed to build Gemini client")?;
    let grader = GradingService::new(
        Box::new(gemini) as Box<dyn AiProvider>,
        AiConfig::for_grading(config.gemini.model.clone(), config.gemini.temperature),
    );
    tracing::info!(model = %config.gemini.model, "Grading service initialized");

    // Initialize Classroom attachments
    let classroom = ClassroomClient::new(config.classroom_api_base.clone())
        .context("Failed to build Classroom client")?;
    let attachments = AttachmentService::new(
        Box::new(classroom) as Box<dyn ClassroomApi>,
        config.public_base_url.clone(),
        ATTACHMENT_TITLE,
    );

    let state = AppState::new(
        sessions,
        grader,
        attachments,
        &config.secret_key,
        config.cookie_secure,
    );
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(
        addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        "AI Auto-Grader listening"
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
