//! larder-api - HTTP API server for larder

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use larder_core::{PriceSource, QuantityCombiner};
use larder_db::Database;
use larder_inference::OllamaCombiner;
use larder_pricing::KrogerClient;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub db: Database,
    /// Assisted-aggregation collaborator. Best effort; failures fall back
    /// to default quantity joining per ingredient.
    pub combiner: Arc<dyn QuantityCombiner>,
    /// Grocery price source for price comparisons.
    pub price_source: Arc<dyn PriceSource>,
    /// Base URL used to build shareable links.
    pub app_base_url: String,
    /// Whether completed/archived lists may transition back to active.
    pub allow_reopen: bool,
}

// =============================================================================
// API ERROR
// =============================================================================

#[derive(Debug)]
pub(crate) enum ApiError {
    Database(larder_core::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<larder_core::Error> for ApiError {
    fn from(err: larder_core::Error) -> Self {
        match &err {
            larder_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            larder_core::Error::ListNotFound(id) => ApiError::NotFound(format!("List {id} not found")),
            larder_core::Error::ItemNotFound(id) => ApiError::NotFound(format!("Item {id} not found")),
            larder_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            larder_core::Error::Conflict(msg) => ApiError::Conflict(msg.clone()),
            larder_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    let friendly_msg = if msg.contains("uq_item_list_ingredient") {
                        "This ingredient already has an item in the list".to_string()
                    } else if msg.contains("uq_share_link_code") {
                        "A share link with this code already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// ROUTER
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Shopping lists
        .route(
            "/api/v1/lists",
            post(handlers::lists::create_list).get(handlers::lists::list_lists),
        )
        .route(
            "/api/v1/lists/:id",
            get(handlers::lists::get_list).delete(handlers::lists::delete_list),
        )
        .route(
            "/api/v1/lists/:id/status",
            patch(handlers::lists::update_status),
        )
        .route(
            "/api/v1/lists/:id/regenerate",
            post(handlers::lists::regenerate),
        )
        // Items
        .route("/api/v1/items/:id/toggle", post(handlers::items::toggle_item))
        .route(
            "/api/v1/items/:id/checked",
            put(handlers::items::set_item_checked),
        )
        // Sharing
        .route("/api/v1/lists/:id/share", post(handlers::share::create_share_link))
        .route("/api/v1/shared/:code", get(handlers::share::get_shared_list))
        .route(
            "/api/v1/shared/:code/items/:item_id/toggle",
            post(handlers::share::toggle_shared_item),
        )
        // Pricing
        .route(
            "/api/v1/lists/:id/prices",
            post(handlers::pricing::compute_prices),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::any())
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]),
        )
        .with_state(state)
}

// =============================================================================
// STARTUP
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "larder_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "larder_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("larder-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/larder".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let app_base_url =
        std::env::var("APP_BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
    let allow_reopen = std::env::var("LARDER_ALLOW_REOPEN")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Assisted-aggregation collaborator
    let combiner: Arc<dyn QuantityCombiner> = Arc::new(OllamaCombiner::from_env());

    // Price source
    let price_source = KrogerClient::from_env();
    info!(
        store = price_source.store_name(),
        configured = price_source.is_configured(),
        "Price source initialized"
    );

    let state = AppState {
        db,
        combiner,
        price_source: Arc::new(price_source),
        app_base_url,
        allow_reopen,
    };

    let app = router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
