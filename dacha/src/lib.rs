//! # dacha: REST backend for a geotagged classifieds marketplace
//!
//! `dacha` serves users, a two-level category taxonomy (categories and subcategories) and
//! advertisements over a JSON REST API. Every advertisement and, optionally, every user carries a
//! location, stored in PostGIS `geography` columns and exchanged as GeoJSON.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum) and persistence is PostgreSQL with
//! the PostGIS extension, reached through a single [`sqlx`] pool. Handlers are plain
//! request/response functions: they validate the body, call a repository, and map rows to JSON.
//! There is no other shared state.
//!
//! - [`api`]: route handlers and request/response models
//! - [`auth`]: password hashing, session tokens and the [`CurrentUser`](api::models::users::CurrentUser)
//!   extractor guarding owner-only routes
//! - [`db`]: repositories, one per table, and their row models
//! - [`spatial`]: GeoJSON location validation and serde adapters
//! - [`config`], [`telemetry`], [`errors`], [`openapi`]: the usual service plumbing
//!
//! Locations are [`geojson`] geometries. They bind to SQL as `jsonb` and PostGIS converts them
//! with `ST_GeomFromGeoJSON` and `ST_AsGeoJSON`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use dacha::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = dacha::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     dacha::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup. The first one enables `postgis`, so the database
//! role needs permission to create the extension (or it must already exist):
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! dacha::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod spatial;
pub mod telemetry;
#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;
pub mod types;

use crate::{
    config::{CorsOrigin, PoolSettings},
    openapi::ApiDoc,
};
use axum::{
    Json, Router,
    http::{self, HeaderValue, Method},
    routing::get,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the dacha database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Pool options from configuration. Zero timeouts mean "never".
fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
}

/// Connect to the database and apply pending migrations.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    info!("Connecting to database");
    let pool = pool_options(&config.database.pool).connect(&config.database.url).await?;
    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration. A `*` entry allows any origin.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    let has_wildcard = cors_config
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard));
    if has_wildcard && cors_config.allow_credentials {
        anyhow::bail!("CORS cannot combine the wildcard origin with allow_credentials");
    }

    let allow_origin = if has_wildcard {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: REST routes, health check, OpenAPI document and reference,
/// optional Prometheus metrics, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{ads, categories, subcategories, users};

    let api_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/registration", axum::routing::post(users::register))
        .route("/users/authentication", axum::routing::post(users::authenticate))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/subcategories",
            get(subcategories::list_subcategories).post(subcategories::create_subcategory),
        )
        .route(
            "/subcategories/{id}",
            get(subcategories::get_subcategory)
                .put(subcategories::update_subcategory)
                .delete(subcategories::delete_subcategory),
        )
        .route("/ads", get(ads::list_ads).post(ads::create_ad))
        .route("/ads/{id}", get(ads::get_ad).put(ads::update_ad).delete(ads::delete_ad))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .merge(api_routes)
        .layer(create_cors_layer(&state.config)?);

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

/// The HTTP service and the resources it owns.
///
/// 1. [`Application::new`] connects to the database, runs migrations and builds the router
/// 2. [`Application::serve`] binds the configured address and handles requests until the
///    shutdown future resolves, then closes the pool and flushes telemetry
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting with configuration: {:#?}", config);
        let pool = setup_database(&config).await?;
        Self::with_pool(config, pool)
    }

    /// Build on an existing, already migrated pool.
    pub fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&state)?;
        Ok(Self { router, config, pool })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorsConfig;
    use crate::test_utils::{create_test_config, create_test_state};

    #[test]
    fn test_pool_options_treat_zero_as_never() {
        let options = pool_options(&PoolSettings {
            max_connections: 4,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 0,
            max_lifetime_secs: 60,
        });
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = create_test_config();
        config.auth.security.cors = CorsConfig {
            allowed_origins: vec![CorsOrigin::Url("https://dacha.example.com/".parse().unwrap())],
            allow_credentials: true,
            max_age: None,
        };
        assert!(create_cors_layer(&config).is_ok());

        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        assert!(create_cors_layer(&config).is_err());
    }

    #[tokio::test]
    async fn test_default_config_allows_any_origin() {
        let state = AppState::builder()
            .db(PgPoolOptions::new().connect_lazy("postgres://localhost/dacha").unwrap())
            .config(Config::default())
            .build();
        let server = axum_test::TestServer::new(build_router(&state).unwrap()).unwrap();

        let response = server
            .get("/healthz")
            .add_header(http::header::ORIGIN, HeaderValue::from_static("https://anywhere.example"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }

    #[tokio::test]
    async fn test_healthz_and_openapi() {
        let state = create_test_state();
        let server = axum_test::TestServer::new(build_router(&state).unwrap()).unwrap();

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");

        let response = server.get("/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/ads/{id}"].is_object());
    }

    #[tokio::test]
    async fn test_metrics_route_absent_by_default() {
        let state = create_test_state();
        let server = axum_test::TestServer::new(build_router(&state).unwrap()).unwrap();
        server
            .get("/internal/metrics")
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
