//! yapple-relay daemon entry point.

use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, warn};
use yapple_relay::config::{self, Config};
use yapple_relay::history::{self, MessageStore};
use yapple_relay::network::Gateway;
use yapple_relay::relay::{Relay, RelayOptions};
use yapple_relay::state::Registry;
use yapple_relay::{http, metrics, telemetry};

const PRUNE_INTERVAL: Duration = Duration::from_secs(86400);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("Failed to load config {config_path}: {e}");
        e
    })?;

    telemetry::init(config.server.json_logs);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting yapple-relay"
    );

    let store = history::open(&config.history, &config.database).await?;

    if let Some(port) = config.server.metrics_port() {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(port).await;
        });
    }

    if let Some(retention) = config.history.retention() {
        spawn_prune_task(Arc::clone(&store), retention);
        info!(
            retention_days = retention.as_secs() / 86400,
            "Message history pruning task started"
        );
    }

    let registry = Arc::new(Registry::new());
    let relay = Arc::new(Relay::new(
        registry,
        store,
        RelayOptions::from(&config.relay),
    ));

    let gateway = Gateway::bind(config.listen, relay).await?;

    tokio::select! {
        result = gateway.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}

/// Prune at startup, then once a day.
fn spawn_prune_task(store: Arc<dyn MessageStore>, retention: Duration) {
    tokio::spawn(
        async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                match store.prune(retention).await {
                    Ok(removed) if removed > 0 => {
                        info!(removed, "Old messages pruned from history");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Failed to prune message history");
                    }
                }
            }
        }
        .instrument(telemetry::spans::maintenance("prune")),
    );
}
