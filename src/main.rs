use std::net::SocketAddr;

use anyhow::anyhow;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use callbridge_gateway::{ServerConfig, routes, state::AppState};

/// Callbridge Gateway - Telephony media stream to realtime AI relay
#[derive(Parser, Debug)]
#[command(name = "callbridge-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind (overrides HOST)
    #[arg(long = "host", value_name = "ADDR")]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from environment. A missing provider credential is
    // fatal here, before any listener is bound.
    let mut config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let address = config.address();

    // Create application state
    let app_state = AppState::new(config);

    // Combine HTTP routes (health + incoming-call) with the media-stream
    // WebSocket route
    let app = Router::new()
        .merge(routes::api::create_api_router())
        .merge(routes::media::create_media_router())
        .with_state(app_state);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    info!("Server listening on http://{}", socket_addr);

    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
