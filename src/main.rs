use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use chat_relay::config::{Cli, Config};
use chat_relay::server::chat_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "chat_relay=debug,tower_http=debug"
    } else {
        "chat_relay=info,tower_http=info"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);

    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("chat-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?.with_cli_overrides(&cli);

    info!(
        listen = config.server.listen,
        upstream = config.upstream.url,
        "Configuration loaded"
    );

    let state = AppState::new(&config)?;
    if state.api_key.is_none() {
        // Requests will be answered with a configuration error until this is fixed.
        warn!(
            env = config.upstream.api_key_env,
            "Upstream API key not set"
        );
    }

    let app = build_router(Arc::new(state));

    let listen_addr = config.server.listen;
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
