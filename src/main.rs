use csp_portal::{
    AppState, ShellPageRenderer, build_navigation,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, assembles the navigation tree
/// (aborting on any configuration defect) and serves the portal.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().unwrap_or_else(|e| panic!("FATAL: invalid configuration: {e}"));

    // 2. Logging: RUST_LOG wins, otherwise portal debug and request-level HTTP logs.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "csp_portal=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    // 3. Navigation assembly. Alias cycles and namespace collisions stop here,
    // before any request is served.
    let navigation = match build_navigation(&config) {
        Ok(tree) => Arc::new(tree),
        Err(e) => {
            tracing::error!(error = %e, "navigation assembly failed");
            panic!("FATAL: navigation assembly failed: {e}");
        }
    };

    // 4. Unified state
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        navigation,
        pages: Arc::new(ShellPageRenderer::default()),
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: cannot bind {bind_addr}: {e}"));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
