use anyhow::{Context, Result};
use clap::Parser;
use livegate_api::{create_router, AppState};
use livegate_core::engine::{LiveHub, StreamProvider};
use livegate_core::relay::CommandRelayFactory;
use livegate_core::room_keys::MemoryRoomKeys;
use livegate_core::{logging, Config, RelaySessionRegistry};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "livegate-api")]
#[command(about = "LiveGate relay control and live statistics API", long_about = None)]
struct Args {
    /// Configuration file (any format supported by the config crate)
    #[arg(short, long, env = "LIVEGATE_CONFIG")]
    config: Option<String>,

    /// HTTP listen address
    #[arg(long)]
    api_addr: Option<String>,

    /// RTMP address of the local engine, e.g. ":1935"
    #[arg(long)]
    rtmp_addr: Option<String>,

    /// Shared secret expected in the `authorization` header
    #[arg(long)]
    api_key: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(addr) = self.api_addr {
            config.server.api_addr = addr;
        }
        if let Some(addr) = self.rtmp_addr {
            config.server.rtmp_addr = addr;
        }
        if let Some(key) = self.api_key {
            config.auth.api_key = key;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut config);

    logging::init_logging(&config.logging)?;

    info!("LiveGate API starting...");
    info!("HTTP address: {}", config.api_address());
    info!("RTMP address: {}", config.server.rtmp_addr);
    info!(
        api_key_set = !config.auth.api_key.is_empty(),
        jwt_enabled = config.jwt.enabled(),
        relay_program = %config.relay.program,
        "Control surface configured"
    );

    // Empty until an RTMP engine linked into this process publishes into it.
    let hub = LiveHub::new();
    warn!("No RTMP engine attached to the stream hub; stats and delete see no streams");
    let streams: Arc<dyn StreamProvider> = Arc::new(hub);
    let room_keys = Arc::new(MemoryRoomKeys::new());
    let factory = Arc::new(CommandRelayFactory::new(&config.relay));
    let relays = Arc::new(RelaySessionRegistry::new(
        factory,
        config.server.rtmp_addr.clone(),
    ));

    let state = AppState::new(&config, Arc::clone(&relays), Some(streams), room_keys)
        .context("Failed to initialize JWT verifier")?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.api_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.api_address()))?;
    info!("HTTP server listening on {}", config.api_address());

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server error: {}", e);
    }

    let stopped = relays.stop_all().await;
    info!(stopped, "LiveGate API shut down");
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
