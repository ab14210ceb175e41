use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use labport_lib::api::router::api_router;
use labport_lib::catalog::Catalog;
use labport_lib::config::{self, AppConfig};
use labport_lib::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = AppConfig::from_env();

    // Catalog configuration errors are fatal at load — never defaulted
    let catalog = match &app_config.catalog_path {
        Some(path) => Catalog::from_file(path),
        None => Catalog::builtin(),
    };
    let catalog = match catalog {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Catalog rejected: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        panels = catalog.panels().len(),
        currency = catalog.currency(),
        "Catalog loaded"
    );

    if let Err(e) = std::fs::create_dir_all(app_config.uploads_dir()) {
        tracing::error!("Cannot create data directory: {e}");
        return ExitCode::FAILURE;
    }

    let bind_addr = app_config.bind_addr;
    let state = Arc::new(AppState::new(app_config, catalog));

    // Fail fast if the store cannot open or migrate
    if let Err(e) = state.open_db() {
        tracing::error!("Database rejected: {e}");
        return ExitCode::FAILURE;
    }

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%bind_addr, "Cannot bind: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%bind_addr, "Listening");

    let app = api_router(state);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
