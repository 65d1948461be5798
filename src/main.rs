//! Chime Timer - A count-down/count-up timer with a chime, driven over HTTP
//!
//! This is the main entry point for the chime-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use chime_timer::{
    config::Config,
    engine::TimerEngine,
    state::AppState,
    api::create_router,
    services::{ChimePlayer, FileSettingsStore},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("chime_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting chime-timer server v1.0.0");
    info!("Configuration: host={}, port={}, assets={} ({})",
          config.host, config.port, config.assets.display(), config.asset_formats);

    let player = config.player_command()?;
    let store = Arc::new(FileSettingsStore::open(&config.settings).await);
    info!("Settings file: {}", store.path().display());
    let chime = Arc::new(
        ChimePlayer::new(&config.assets, player).with_extensions(config.asset_formats()),
    );
    let locale = config.device_locale();
    info!("Device locale: {}", locale.to_language_tag());

    // The engine subscribes to the store and owns the tick loop
    let engine = TimerEngine::new(store, chime, locale);
    let state = Arc::new(AppState::new(engine.clone(), config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /toggle      - Start or pause");
    info!("  POST /restart     - Reset to start value and start");
    info!("  POST /double-tap  - Reset to start value");
    info!("  POST /start, /stop, /reset");
    info!("  POST /confirm     - Apply new duration to active timer");
    info!("  POST /dismiss     - Keep active timer as is");
    info!("  GET  /settings    - Stored settings (POST to change)");
    info!("  GET  /languages   - Supported languages");
    info!("  GET  /status      - Current timer state");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    engine.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
