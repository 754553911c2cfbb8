use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fifo_bridge::channel::{self, ChannelReader};
use fifo_bridge::config::Config;
use fifo_bridge::error::StartupError;
use fifo_bridge::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present; variables may also be set externally.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Config::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "fifo-bridge stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let port = config.port;
    let state = AppState::new(config);

    channel::provision(&state.config.fifo_path)?;
    ChannelReader::new(
        state.config.fifo_path.clone(),
        state.config.fifo_retry,
        state.engine.clone(),
    )
    .spawn()
    .map_err(StartupError::ReaderSpawn)?;

    tracing::info!(
        fifo = %state.config.fifo_path.display(),
        relay_client_messages = state.config.relay_client_messages,
        "fifo-bridge configured"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(fifo_bridge::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!(%addr, "fifo-bridge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
