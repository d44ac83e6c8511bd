//! Server startup utilities.

use cairn_config::{AppConfig, ObservabilityConfig};
use cairn_core::{CairnError, CairnResult};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Latency buckets for policy runs, from sub-millisecond cache hits up to
/// slow store round-trips.
const POLICY_DURATION_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `observability.log_level` when set.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},cairn={level},tower_http=debug",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Installs the Prometheus recorder and describes the cache metrics.
///
/// Returns `None` when metrics are disabled.
pub fn init_metrics(config: &ObservabilityConfig) -> CairnResult<Option<PrometheusHandle>> {
    if !config.metrics_enabled {
        info!("Metrics disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(cairn_service::metrics::names::POLICY_DURATION_SECONDS.to_string()),
            POLICY_DURATION_BUCKETS,
        )
        .map_err(|e| CairnError::Configuration(format!("Invalid metric buckets: {e}")))?
        .install_recorder()
        .map_err(|e| CairnError::Internal(format!("Failed to install metrics recorder: {e}")))?;

    cairn_service::metrics::register_metrics();
    info!(path = %config.metrics_path, "Prometheus metrics enabled");
    Ok(Some(handle))
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r"
   ___      _
  / __|__ _(_)_ _ _ _
 | (__/ _` | | '_| ' \
  \___\__,_|_|_| |_||_|
"
    );
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let addr = config.server.addr();
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}/users/all", addr);
    info!("Health:    http://{}/health", addr);
    info!("API Docs:  http://{}/swagger-ui", addr);
    if config.observability.metrics_enabled {
        info!("Metrics:   http://{}{}", addr, config.observability.metrics_path);
    }
    info!("Cache:     {} ({} listing)", config.cache.backend, config.cache.list_strategy);
    info!("{}", separator);
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info(&AppConfig::default());
    }

    #[test]
    fn test_metrics_disabled_installs_nothing() {
        let config = ObservabilityConfig {
            metrics_enabled: false,
            ..ObservabilityConfig::default()
        };

        assert!(init_metrics(&config).unwrap().is_none());
    }
}
