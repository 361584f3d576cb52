//! laneway-api - HTTP/WebSocket gateway for the laneway positioning engine
//!
//! A thin request layer: REST endpoints map onto `Coordinator::submit` and
//! the store read paths, and the WebSocket endpoint maps board
//! subscriptions onto the engine's fan-out router. All ordering and
//! consistency logic lives in `laneway-engine`; this binary only does
//! transport, configuration, and error mapping.

mod handlers;
mod ws;

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use uuid::Uuid;

use laneway_core::{
    defaults::{REQUEST_BODY_LIMIT_BYTES, SERVER_HOST, SERVER_PORT},
    ActivityLog, BoardStore, Error, LedgerStore, NotificationStore, Result,
};
use laneway_db::Database;
use laneway_engine::{BoardRouter, Coordinator};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs, so request IDs in
/// logs sort chronologically.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Server configuration, read from the environment at startup.
///
/// | Variable          | Default                       | Meaning                         |
/// |-------------------|-------------------------------|---------------------------------|
/// | `DATABASE_URL`    | `postgres://localhost/laneway`| PostgreSQL connection string    |
/// | `HOST`            | `0.0.0.0`                     | Bind address                    |
/// | `PORT`            | `3000`                        | Bind port                       |
/// | `LOG_FORMAT`      | `text`                        | `text` or `json` log output     |
/// | `ALLOWED_ORIGINS` | (empty = allow any)           | Comma-separated CORS whitelist  |
/// | `RUST_LOG`        | crate-level debug             | Standard env filter             |
#[derive(Debug, Clone)]
struct ServerConfig {
    host: String,
    port: u16,
    database_url: String,
    log_format: String,
    allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            database_url: "postgres://localhost/laneway".to_string(),
            log_format: "text".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a number: {raw}")))?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            log_format: std::env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    #[allow(dead_code)]
    fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    #[allow(dead_code)]
    fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Shared state handed to every handler. Store fields are trait objects, so
/// the gateway serves equally off PostgreSQL or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<dyn BoardStore>,
    pub activity: Arc<dyn ActivityLog>,
    pub notifications: Arc<dyn NotificationStore>,
    pub coordinator: Coordinator,
    /// Active WebSocket connection count, for the lifecycle logs.
    pub ws_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        boards: Arc<dyn BoardStore>,
        activity: Arc<dyn ActivityLog>,
        notifications: Arc<dyn NotificationStore>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        Self {
            boards,
            activity,
            notifications,
            coordinator: Coordinator::new(ledger, BoardRouter::new()),
            ws_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn from_database(db: &Database) -> Self {
        Self::new(
            Arc::new(db.clone().boards),
            Arc::new(db.clone().activity),
            Arc::new(db.clone().notifications),
            Arc::new(db.clone().ledger),
        )
    }
}

/// OpenAPI metadata for the gateway surface, served at
/// `/api/v1/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Laneway API",
        description = "Concurrent task-positioning engine: serialized board mutations with realtime fan-out"
    ),
    tags(
        (name = "Mutations", description = "Serialized board mutations"),
        (name = "Boards", description = "Board and queue bootstrap, snapshots"),
        (name = "Activity", description = "Committed change history"),
        (name = "Notifications", description = "Per-user durable notifications"),
        (name = "Realtime", description = "WebSocket board subscriptions")
    )
)]
struct ApiDoc;

// =============================================================================
// ROUTER
// =============================================================================

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/openapi.json", get(openapi_spec))
        .route("/api/v1/mutations", post(handlers::submit_mutation))
        .route(
            "/api/v1/boards",
            post(handlers::create_board).get(handlers::list_boards),
        )
        .route("/api/v1/boards/:id", get(handlers::board_snapshot))
        .route("/api/v1/boards/:id/queues", post(handlers::create_queue))
        .route("/api/v1/boards/:id/activity", get(handlers::board_activity))
        .route("/api/v1/users/:id/activity", get(handlers::user_activity))
        .route("/api/v1/items/:id/comments", get(handlers::list_comments))
        .route("/api/v1/queues/:id/reindex", post(handlers::reindex_queue))
        .route("/api/v1/notifications", get(handlers::list_notifications))
        .route(
            "/api/v1/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route("/api/v1/notifications/:id/read", post(handlers::mark_read))
        .route(
            "/api/v1/notifications/read-all",
            post(handlers::mark_all_read),
        )
        .route("/api/v1/ws", get(ws::ws_handler))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, handlers::ACTOR_HEADER])
}

fn init_logging(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "laneway_api=debug,laneway_engine=debug,laneway_db=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_logging(&config.log_format);
    info!(
        subsystem = "api",
        op = "startup",
        log_format = %config.log_format,
        "Logging initialized"
    );

    info!(subsystem = "api", op = "startup", "Connecting to database");
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let state = AppState::from_database(&db);
    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&config.allowed_origins))
        .layer(RequestBodyLimitLayer::new(REQUEST_BODY_LIMIT_BYTES));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        subsystem = "api",
        op = "startup",
        %addr,
        "laneway-api listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

// =============================================================================
// GATEWAY TESTS
// =============================================================================
