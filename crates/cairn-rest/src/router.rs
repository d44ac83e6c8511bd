//! Main application router.

use crate::{
    controllers::{health_controller, user_controller},
    middleware::logging_middleware,
    openapi::ApiDoc,
    state::AppState,
};
use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, routing::get, Router};
use cairn_config::{AppConfig, ServerConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Creates the main application router.
///
/// The metrics route is mounted only when a Prometheus handle is given and
/// metrics are enabled in the configuration.
pub fn create_router(
    state: AppState,
    config: &AppConfig,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let cors = create_cors_layer(&config.server);

    let mut router = Router::new()
        .merge(health_controller::router())
        .nest("/users", user_controller::router())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root));

    if let Some(handle) = metrics.filter(|_| config.observability.metrics_enabled) {
        router = router.route(
            &config.observability.metrics_path,
            get(move || std::future::ready(handle.render())),
        );
    }

    let router = router
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware));

    info!(
        list_strategy = %config.cache.list_strategy,
        "Router created with user endpoints and Swagger UI at /swagger-ui"
    );
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }

    if server_config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = server_config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Cairn user service"
}
