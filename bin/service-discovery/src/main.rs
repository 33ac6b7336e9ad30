use anyhow::Result;
use router_core::ConfigMessage;
use router_kubernetes::{KubeResourceClient, KubernetesConfig, KubernetesProvider};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting service-discovery daemon...");

    let config = match std::env::var("ROUTER_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            KubernetesConfig::load(&path)?
        }
        Err(_) => KubernetesConfig::default(),
    }
    .apply_env();
    config.validate()?;

    let client = KubeResourceClient::from_config(&config).await?;
    info!(
        endpoint = ?config.endpoint,
        resolution = ?config.endpoint_resolution,
        "Kubernetes client initialized"
    );

    let (tx, mut rx) = mpsc::channel(1);
    let shutdown = CancellationToken::new();
    let provider = KubernetesProvider::new(client, &config)?.provide(tx, shutdown.clone());

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => log_configuration(&message)?,
                None => {
                    warn!("Provider exited");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, exiting...");
                shutdown.cancel();
                break;
            }
        }
    }

    provider.await?;
    Ok(())
}

fn log_configuration(message: &ConfigMessage) -> Result<()> {
    let configuration = &message.configuration;
    info!(
        provider = %message.provider_name,
        backends = configuration.backends.len(),
        frontends = configuration.frontends.len(),
        servers = configuration.server_count(),
        "Received configuration"
    );
    debug!("{}", serde_json::to_string_pretty(configuration)?);
    Ok(())
}
