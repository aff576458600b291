use pickaxe_events::NullHooks;
use pickaxe_server::config::ServerConfig;
use pickaxe_server::network;
use pickaxe_server::registry::Registry;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Pickaxe server...");

    let config = Arc::new(ServerConfig::load(Path::new("config/server.toml"))?);
    info!(
        "Config loaded: bind={}:{}, max_players={}, upstream={}",
        config.bind,
        config.port,
        config.max_players,
        config.upstream.is_some()
    );

    // No scripting/plugin host is bound yet; NullHooks synthesizes a minimal
    // status payload and otherwise only logs.
    let hooks: Arc<dyn pickaxe_events::Hooks> = Arc::new(NullHooks);
    let registry = Registry::new();

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    accept_loop(listener, config, hooks, registry).await;
    Ok(())
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    hooks: Arc<dyn pickaxe_events::Hooks>,
    registry: Arc<Registry>,
) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let config = config.clone();
                let hooks = hooks.clone();
                let registry = registry.clone();
                tokio::spawn(async move {
                    network::handle_connection(socket, config, hooks, registry).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
