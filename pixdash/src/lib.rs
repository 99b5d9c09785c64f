//! Sales analytics layer for Pix-charged bot funnels.
//!
//! pixdash reads an append-only log of interaction and purchase events and
//! turns it into the numbers a sales dashboard renders: funnel snapshots,
//! per-bot rollups, a daily revenue series, and a paginated transaction
//! feed. Every metric is recomputed fresh per request - there is no
//! materialized cache, so identical event logs always produce identical
//! reports.
//!
//! # Architecture
//!
//! - [`store`]: event model plus the [`EventStore`](store::EventStore) trait
//!   with Postgres and in-memory implementations
//! - [`engine`]: the aggregation engine - pure read paths over the store
//! - [`api`]: thin axum handlers and their request/response models
//! - [`config`]: figment-based configuration with env overrides
//! - [`telemetry`]: tracing setup with optional OTLP export
//!
//! The binary entrypoint wires these together: load config, init telemetry,
//! [`Application::new`], [`Application::serve`] with graceful shutdown.

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod store;
pub mod telemetry;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{Router, routing::get};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use config::{CorsOrigin, StoreConfig};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use store::{EventStore, MemoryEventStore, PgEventStore};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{PurchaseId, SubjectId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(store)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub config: Config,
}

/// Get the pixdash database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pixdash",
        description = "Analytics aggregation over Pix-charged bot funnels: funnel snapshots, \
                       bot rollups, daily revenue series and a paginated transaction feed."
    ),
    paths(
        api::handlers::dashboard::get_dashboard,
        api::handlers::bots::list_bots,
        api::handlers::config::get_config,
    ),
    components(schemas(
        engine::DashboardReport,
        api::models::bots::BotNamesResponse,
        api::models::config::ConfigResponse,
    )),
    tags(
        (name = "dashboard", description = "The reporting endpoint"),
        (name = "bots", description = "Bot name listing for filter UIs"),
        (name = "config", description = "Sanitized configuration metadata"),
    )
)]
pub struct ApiDoc;

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // tower-http forbids `*` inside an origin list; a wildcard anywhere in
    // the configuration means "allow any"
    let origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(config.cors.allow_credentials))
}

/// Build the application router with all endpoints and middleware.
///
/// - Reporting API under `/api/v1`
/// - Liveness probe at `/healthz`
/// - Scalar API documentation at `/docs`
/// - Optional Prometheus metrics at `/internal/metrics`
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/dashboard", get(api::handlers::dashboard::get_dashboard))
        .route("/bots", get(api::handlers::bots::list_bots))
        .route("/config", get(api::handlers::config::get_config))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects the event store, runs
///    migrations when backed by Postgres, and builds the router
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting pixdash with configuration: {:#?}", config);

        let (store, pool): (Arc<dyn EventStore>, Option<PgPool>) = match &config.store {
            StoreConfig::Memory => {
                warn!("Using the in-memory event store; all data is lost on restart");
                (Arc::new(MemoryEventStore::new()), None)
            }
            StoreConfig::Postgres { url, pool } => {
                let pg = PgPoolOptions::new()
                    .max_connections(pool.max_connections)
                    .min_connections(pool.min_connections)
                    .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
                    .idle_timeout((pool.idle_timeout_secs > 0).then(|| Duration::from_secs(pool.idle_timeout_secs)))
                    .max_lifetime((pool.max_lifetime_secs > 0).then(|| Duration::from_secs(pool.max_lifetime_secs)))
                    .connect(url)
                    .await?;
                migrator().run(&pg).await?;
                info!("Connected to the Postgres event store");
                (Arc::new(PgEventStore::new(pg.clone())), Some(pg))
            }
        };

        let state = AppState::builder().store(store).config(config.clone()).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("pixdash listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
