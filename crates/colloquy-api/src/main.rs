use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colloquy_api::{
    config::{Config, EngineKind},
    middleware::{auth, logging},
    routes::{assistants, health, runs, threads},
    state::AppState,
};
use colloquy_llm::{
    GenerateOptions, HttpInferenceClient, InferenceClient, SimulatedInferenceClient,
};
use colloquy_persist::{StateManager, Store};
use colloquy_run::RunOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Colloquy API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Open the store and build the state manager
    tracing::info!("Opening store: {}", config.database.url);
    let store = Store::open_with_pool_size(&config.database.url, config.database.pool_size).await?;
    let state_manager = Arc::new(StateManager::new(store));

    // Select the inference backend once, at startup
    let inference: Arc<dyn InferenceClient> = match config.inference.engine {
        EngineKind::Http => {
            tracing::info!(
                "Using HTTP inference backend at {}",
                config.inference.base_url
            );
            Arc::new(HttpInferenceClient::with_timeouts(
                &config.inference.base_url,
                Duration::from_secs(config.inference.connect_timeout_secs),
                Duration::from_secs(config.inference.read_timeout_secs),
            )?)
        }
        EngineKind::Simulated => {
            tracing::info!("Using simulated inference backend");
            Arc::new(SimulatedInferenceClient::new())
        }
    };

    // Build the run orchestrator
    let orchestrator = Arc::new(
        RunOrchestrator::new(Arc::clone(&state_manager), inference).with_options(
            GenerateOptions::new()
                .max_tokens(config.inference.max_tokens)
                .temperature(config.inference.temperature),
        ),
    );

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), state_manager, orchestrator));

    // Build router
    let app = build_router(state.clone());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    // Versioned API surface, behind the shared credential check
    let api_routes = Router::new()
        // Assistants
        .route(
            "/assistants",
            post(assistants::create_assistant).get(assistants::list_assistants),
        )
        .route(
            "/assistants/:assistant_id",
            get(assistants::get_assistant)
                .patch(assistants::update_assistant)
                .delete(assistants::delete_assistant),
        )
        // Threads
        .route(
            "/threads",
            post(threads::create_thread).get(threads::list_threads),
        )
        .route(
            "/threads/:thread_id",
            get(threads::get_thread)
                .patch(threads::update_thread)
                .delete(threads::delete_thread),
        )
        // Messages
        .route(
            "/threads/:thread_id/messages",
            get(threads::list_messages).post(threads::add_message),
        )
        .route("/threads/:thread_id/context", get(threads::get_context))
        .route("/threads/:thread_id/prune", post(threads::prune_messages))
        // Runs
        .route("/threads/:thread_id/runs", post(runs::create_run))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // Build full router with middleware
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/v1", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(300)))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
