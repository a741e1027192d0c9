//! VISU display server binary.
//!
//! Starts an axum HTTP server that holds the current emotion, accepts updates
//! from the agent and pushes them to every connected face display. Shuts down
//! gracefully on SIGTERM/SIGINT.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use visu_server::{app, config, AppState, EmotionHub};
use visu_types::startup::resolve_config_path;

#[tokio::main]
async fn main() {
    let (config_path, config_source) = resolve_config_path("VISU_CONFIG_PATH", "visu-server.toml");

    // Load configuration
    let config = config::load_config(Some(&config_path))
        .expect("failed to load configuration, the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(source = %config_source, path = %config_path, "resolved startup configuration path");

    let state = AppState {
        hub: EmotionHub::new(),
        ws_idle_timeout: config.server.ws_idle_timeout(),
        static_dir: config.server.static_dir.clone(),
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting visu display server");
    tracing::info!(
        "agent should post emotions to http://{}{}",
        addr,
        visu_types::UPDATE_EMOTION_PATH
    );

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address, is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = termination_signal().await;
            tracing::info!(signal, "shutting down, closing display connections");
        })
        .await
        .expect("server error");

    tracing::info!("visu display server shut down");
}

/// Resolves with the name of the first termination signal received.
async fn termination_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.expect("failed to install Ctrl+C handler");
                "SIGINT"
            }
            _ = sigterm.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        "SIGINT"
    }
}
