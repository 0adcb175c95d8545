//! VOC Atlas API
//!
//! HTTP entry point for the VOC research catalog.
//! Handles:
//! - Sites, datasets, VOCs, contacts and publications
//! - VOC subclass taxonomy and membership queries
//! - Bounding-box queries on site locations
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    routing::get,
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vocatlas_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    metrics,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DbPool>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize tracing
    init_tracing(&config.observability);

    info!("Starting VOC Atlas API v{}", vocatlas_common::VERSION);

    // Initialize metrics
    install_metrics_exporter(config.observability.metrics_port)?;

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    // Create app state
    let state = AppState {
        config: config.clone(),
        db: Arc::new(db),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Serve Prometheus metrics on their own port; port 0 disables the exporter
fn install_metrics_exporter(port: u16) -> anyhow::Result<()> {
    if port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .install()?;

    metrics::register_metrics();
    info!(port, "Metrics exporter listening");

    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());
    let concurrency = ConcurrencyLimitLayer::new(state.config.server.max_concurrent_requests);

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Site endpoints
        .route("/sites", get(handlers::sites::list_sites).post(handlers::sites::create_site))
        .route("/sites/{site_id}", get(handlers::sites::get_site))
        .route(
            "/sites/by-area/{min_lon}/{min_lat}/{max_lon}/{max_lat}",
            get(handlers::sites::sites_by_area),
        )

        // Dataset endpoints
        .route(
            "/datasets",
            get(handlers::datasets::list_datasets).post(handlers::datasets::create_dataset),
        )
        .route("/datasets/by-site/{site_id}", get(handlers::datasets::datasets_by_site))
        .route("/datasets/by-country/{country}", get(handlers::datasets::datasets_by_country))
        .route(
            "/datasets/by-subclass/{subclass_name}",
            get(handlers::datasets::datasets_by_subclass),
        )
        .route(
            "/datasets/by-area/{min_lon}/{min_lat}/{max_lon}/{max_lat}",
            get(handlers::datasets::datasets_by_area),
        )

        // VOC endpoints
        .route("/vocs", get(handlers::vocs::list_vocs).post(handlers::vocs::create_voc))
        .route("/vocs/by-subclass/{subclass_name}", get(handlers::vocs::vocs_by_subclass))

        // VOC subclass endpoints
        .route(
            "/voc-subclasses",
            get(handlers::voc_subclasses::list_voc_subclasses)
                .post(handlers::voc_subclasses::create_voc_subclass),
        )
        .route(
            "/voc-subclasses/{subclass_id}/ancestors",
            get(handlers::voc_subclasses::subclass_ancestors),
        )
        .route(
            "/voc-subclasses/by-voc-id/{voc_id}",
            get(handlers::voc_subclasses::subclasses_by_voc),
        )

        // Contact endpoints
        .route(
            "/contacts",
            get(handlers::contacts::list_contacts).post(handlers::contacts::create_contact),
        )
        .route("/contacts/by-dataset/{dataset_id}", get(handlers::contacts::contacts_by_dataset))

        // Publication endpoints
        .route(
            "/publications",
            get(handlers::publications::list_publications)
                .post(handlers::publications::create_publication),
        )
        .route(
            "/publications/by-dataset/{dataset_id}",
            get(handlers::publications::publications_by_dataset),
        )

        .route_layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(timeout)
        .layer(concurrency)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;
    use vocatlas_common::db::models::Site;

    fn router_over(db: MockDatabase) -> Router {
        let state = AppState {
            config: Arc::new(AppConfig::default()),
            db: Arc::new(DbPool {
                primary: db.into_connection(),
                replica: None,
            }),
        };
        create_router(state)
    }

    /// Router over a mock database that holds no rows; only requests rejected
    /// before the database is reached are meaningful against it
    fn test_router() -> Router {
        router_over(MockDatabase::new(DatabaseBackend::Postgres))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        send_to(test_router(), request).await
    }

    async fn send_to(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_inverted_box_is_rejected() {
        let (status, json) = send(get("/sites/by-area/10/0/0/5")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["field"], "min_lon");
    }

    #[tokio::test]
    async fn test_box_latitude_out_of_range() {
        let (status, json) = send(get("/datasets/by-area/0/-95/10/5")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["field"], "min_lat");
    }

    #[tokio::test]
    async fn test_sites_on_box_boundary_are_returned() {
        let corner = Site {
            id: 1,
            name: Some("Corner".to_string()),
            region: None,
            country: "Testland".to_string(),
            typology: None,
            longitude: Some(10.0),
            latitude: Some(5.0),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![corner]]);

        let (status, json) = send_to(router_over(db), get("/sites/by-area/0/0/10/5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["geo_location"]["coordinates"], serde_json::json!([10.0, 5.0]));
    }

    #[tokio::test]
    async fn test_empty_box_is_no_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Site>::new()]);

        let (status, json) = send_to(router_over(db), get("/sites/by-area/0/0/10/5")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NO_MATCHES");
    }

    #[tokio::test]
    async fn test_create_site_validation() {
        let (status, json) = send(post_json("/sites", serde_json::json!({"country": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_dataset_period_validation() {
        let body = serde_json::json!({
            "sampling_period_begin": "2022-03-01",
            "sampling_period_end": "2022-01-01",
        });
        let (status, json) = send(post_json("/datasets", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["field"], "sampling_period_end");
    }

    #[tokio::test]
    async fn test_create_publication_requires_url() {
        let (status, _) = send(post_json("/publications", serde_json::json!({"link": "nope"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = send(get("/papers")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = test_router().oneshot(get("/health")).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
