/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::blob::FsBlobStore;
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone())).await?;
/// let store = Arc::new(PgStore::new(pool.clone()));
/// let blobs = Arc::new(FsBlobStore::new(config.media.root.clone()));
/// let state = AppState::new(config, store, blobs).with_database(pool);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::blob::BlobStore;
use taskboard_shared::services::ServiceContext;
use taskboard_shared::store::SharedStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Room for multipart framing and the `card` field around the payload
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Store, blob store, token settings and policies for the service layer
    pub services: Arc<ServiceContext>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Connection pool, when running against PostgreSQL; used by `/health`
    pub db: Option<PgPool>,
}

impl AppState {
    /// Creates new application state
    pub fn new(config: Config, store: SharedStore, blobs: Arc<dyn BlobStore>) -> Self {
        let services = ServiceContext::new(store, blobs, config.token_settings())
            .with_parent_resolution(config.parent_resolution)
            .with_max_upload_bytes(config.media.max_upload_bytes);

        Self {
            services: Arc::new(services),
            config: Arc::new(config),
            db: None,
        }
    }

    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/                       # register, login, logout, refresh (public)
///     │   └── GET /check_token         # (authenticated)
///     ├── /boards[/:slug[/members[/:user]]]
///     ├── /lists[/:slug[/members[/:user]]]
///     ├── /cards[/:slug[/members[/:user]]]
///     ├── /comments[/:slug]
///     ├── /attachments[/:slug[/content]]
///     └── /tags[/:slug]
/// ```
///
/// Everything under `/v1` except the public auth routes requires a bearer
/// access token.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/refresh", post(routes::auth::refresh));

    let upload_limit = state.config.media.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let protected_routes = Router::new()
        .route("/auth/check_token", get(routes::auth::check_token))
        .route("/auth/me", get(routes::auth::me))
        // Boards
        .route("/boards", get(routes::boards::list).post(routes::boards::create))
        .route(
            "/boards/:slug",
            get(routes::boards::get)
                .put(routes::boards::replace)
                .patch(routes::boards::update)
                .delete(routes::boards::delete),
        )
        .route(
            "/boards/:slug/members",
            get(routes::members::list_board_members).post(routes::members::grant_board_member),
        )
        .route(
            "/boards/:slug/members/:user",
            patch(routes::members::update_board_member),
        )
        // Lists
        .route("/lists", get(routes::lists::list).post(routes::lists::create))
        .route(
            "/lists/:slug",
            get(routes::lists::get)
                .put(routes::lists::replace)
                .patch(routes::lists::update)
                .delete(routes::lists::delete),
        )
        .route(
            "/lists/:slug/members",
            get(routes::members::list_list_participants)
                .post(routes::members::grant_list_participant),
        )
        .route(
            "/lists/:slug/members/:user",
            patch(routes::members::update_list_participant),
        )
        // Cards
        .route("/cards", get(routes::cards::list).post(routes::cards::create))
        .route(
            "/cards/:slug",
            get(routes::cards::get)
                .put(routes::cards::replace)
                .patch(routes::cards::update)
                .delete(routes::cards::delete),
        )
        .route(
            "/cards/:slug/members",
            get(routes::members::list_card_participants)
                .post(routes::members::grant_card_participant),
        )
        .route(
            "/cards/:slug/members/:user",
            patch(routes::members::update_card_participant),
        )
        // Comments
        .route(
            "/comments",
            get(routes::comments::list).post(routes::comments::create),
        )
        .route(
            "/comments/:slug",
            get(routes::comments::get)
                .put(routes::comments::replace)
                .patch(routes::comments::update)
                .delete(routes::comments::delete),
        )
        // Attachments
        .route(
            "/attachments",
            get(routes::attachments::list)
                .post(routes::attachments::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/attachments/:slug",
            get(routes::attachments::get)
                .put(routes::attachments::replace)
                .patch(routes::attachments::update)
                .delete(routes::attachments::delete),
        )
        .route(
            "/attachments/:slug/content",
            get(routes::attachments::content),
        )
        // Tags
        .route("/tags", get(routes::tags::list).post(routes::tags::create))
        .route(
            "/tags/:slug",
            get(routes::tags::get)
                .put(routes::tags::replace)
                .patch(routes::tags::update)
                .delete(routes::tags::delete),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = public_auth_routes.merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
