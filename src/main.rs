//! Weak Cache demo
//!
//! Runs a small workload against a cache and periodically logs its
//! statistics until interrupted.

use std::time::Duration;

use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weak_cache::{Config, WeakCache};

/// Number of distinct keys the workload rotates through.
const KEY_SPACE: u64 = 8;

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache, which starts its sweep loop
/// 4. Fetch keys on a timer, holding each handle briefly
/// 5. Log statistics every second
/// 6. Close the cache on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weak_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Weak Cache demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: gc_interval={}ms, min_ttl={}ms, max_ttl={}ms",
        config.gc_interval_ms, config.min_ttl_ms, config.max_ttl_ms
    );

    let cache = WeakCache::<String>::from_config(&config)?;

    let mut fetch_ticker = tokio::time::interval(Duration::from_millis(100));
    let mut stats_ticker = tokio::time::interval(Duration::from_secs(1));
    let mut held = Vec::new();
    let mut round: u64 = 0;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = fetch_ticker.tick() => {
                round += 1;
                let key = format!("item:{}", round % KEY_SPACE);
                let handle = cache.fetch(&key, config.min_ttl(), config.max_ttl(), || {
                    debug!(key = %key, "Producing value");
                    Ok::<_, anyhow::Error>(format!("value for {key} (round {round})"))
                })?;
                held.push(handle);

                // Keep a few handles alive so some records stay reachable.
                if held.len() > 3 {
                    held.remove(0);
                }
            }
            _ = stats_ticker.tick() => {
                let stats = cache.stats();
                info!(stats = %serde_json::to_string(&stats)?, "Cache statistics");
            }
        }
    }

    held.clear();
    cache.close();
    info!(remaining = cache.len(), "Demo shutdown complete");

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
