//! HTTP API gateway for menuforge.
//!
//! Exposes the suggestion pipeline as a small REST surface:
//! - `POST /v1/menu/suggest` — run the pipeline for one query
//! - `GET /health` — provider / inventory / knowledge-store probes
//!
//! Built on Axum. Security layers applied: permissive CORS (the API is
//! unauthenticated), request body size limit, in-memory rate limiting with
//! `/health` exempt, and HTTP trace logging.

pub mod history;
pub mod routes;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use history::DishHistory;
use menuforge_config::AppConfig;
use menuforge_core::{IngredientSource, KnowledgeStore, Provider};
use menuforge_inventory::{BuiltinSource, FallbackSource, SqliteSource};
use menuforge_knowledge::{InMemoryStore, RemoteVectorStore};
use menuforge_pipeline::{
    BudgetPolicy, LlmFilterSpecBuilder, LlmIntentExtractor, LlmMenuComposer, Orchestrator,
};

/// Shared application state for the gateway.
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub provider: Arc<dyn Provider>,
    pub inventory: Arc<dyn IngredientSource>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub history: DishHistory,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<AppState>;

/// Build the full application state from config: provider router, ingredient
/// source chain, knowledge store, and the orchestrator wired over them.
pub async fn build_state(config: AppConfig) -> menuforge_core::Result<SharedState> {
    let router = menuforge_providers::build_from_config(&config);
    let provider = router.default().ok_or_else(|| menuforge_core::Error::Config {
        message: format!("No provider registered for '{}'", config.default_provider),
    })?;

    let inventory: Arc<dyn IngredientSource> = match config.inventory.backend.as_str() {
        "sqlite" => {
            let primary = SqliteSource::new(&config.inventory.sqlite_path).await?;
            // Primary outages recover locally through the builtin snapshot.
            Arc::new(
                FallbackSource::new("inventory")
                    .add(Arc::new(primary), Duration::from_secs(config.inventory.timeout_secs))
                    .add_default(Arc::new(BuiltinSource::new())),
            )
        }
        _ => Arc::new(BuiltinSource::new()),
    };

    let knowledge: Arc<dyn KnowledgeStore> = match config.knowledge.backend.as_str() {
        "remote" => Arc::new(RemoteVectorStore::new(
            config.knowledge.index_url.clone().unwrap_or_default(),
            config.knowledge.api_key.clone().unwrap_or_default(),
            provider.clone(),
            &config.knowledge.embedding_model,
        )),
        _ => Arc::new(InMemoryStore::new(provider.clone(), &config.knowledge.embedding_model)),
    };

    let extractor = Arc::new(LlmIntentExtractor::new(
        provider.clone(),
        &config.default_model,
        BudgetPolicy { default_per_person: config.budget.default_per_person },
    ));
    let spec_builder = Arc::new(LlmFilterSpecBuilder::new(provider.clone(), &config.default_model));
    let composer = Arc::new(
        LlmMenuComposer::new(provider.clone(), &config.default_model, config.default_temperature)
            .with_max_tokens(config.default_max_tokens),
    );

    let orchestrator = Arc::new(
        Orchestrator::new(extractor, spec_builder, inventory.clone(), knowledge.clone(), composer)
            .with_top_k(config.knowledge.top_k),
    );

    Ok(Arc::new(AppState {
        config,
        orchestrator,
        provider,
        inventory,
        knowledge,
        history: DishHistory::new(),
        started_at: chrono::Utc::now(),
    }))
}

/// Build the Axum router with all gateway routes and layers.
pub fn build_router(state: SharedState) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(
        state.config.gateway.rate_limit_per_minute,
        Duration::from_secs(60),
    ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/menu/suggest", post(routes::suggest_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let state = build_state(config).await?;
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key.
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<std::time::Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        let now = std::time::Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Evict stale entries once the map grows large
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Rate limiting middleware — keys clients by `X-Forwarded-For` (or
/// "anonymous") and returns 429 when exceeded. The /health endpoint is
/// exempt so monitoring can poll it freely.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(40).collect::<String>(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

// --- Health ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
    provider: bool,
    inventory: bool,
    knowledge: bool,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let (provider, inventory, knowledge) = tokio::join!(
        state.provider.health_check(),
        state.inventory.health_check(),
        state.knowledge.health_check(),
    );

    let provider = provider.unwrap_or(false);
    let inventory = inventory.unwrap_or(false);
    let knowledge = knowledge.unwrap_or(false);

    Json(HealthResponse {
        status: if provider && inventory && knowledge { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
        provider,
        inventory,
        knowledge,
    })
}
