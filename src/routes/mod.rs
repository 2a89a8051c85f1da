use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper, `{message, data}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

/// Pagination block attached to paginated listings
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub last_page: u64,
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Multipart framing adds overhead on top of the file itself
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_size + 64 * 1024);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        // Division directory
        .route("/divisions", get(handlers::division::index))
        // Pengurus routes (ranked listing is public)
        .route(
            "/pengurus",
            get(handlers::pengurus::index)
                .post(handlers::pengurus::store)
                .layer(upload_limit.clone()),
        )
        .route(
            "/pengurus/:id",
            get(handlers::pengurus::show)
                .put(handlers::pengurus::update)
                .delete(handlers::pengurus::destroy)
                .layer(upload_limit.clone()),
        )
        // Documentation routes
        .route(
            "/documentations",
            get(handlers::documentation::index)
                .post(handlers::documentation::store)
                .layer(upload_limit.clone()),
        )
        .route(
            "/documentations/:id",
            get(handlers::documentation::show)
                .put(handlers::documentation::update)
                .delete(handlers::documentation::destroy)
                .layer(upload_limit.clone()),
        )
        // Schedule routes
        .route(
            "/schedules",
            get(handlers::schedule::index).post(handlers::schedule::store),
        )
        .route(
            "/schedules/:id",
            get(handlers::schedule::show)
                .put(handlers::schedule::update)
                .delete(handlers::schedule::destroy),
        )
        // Profile description routes
        .route(
            "/profile-descs",
            get(handlers::profile_desc::index).post(handlers::profile_desc::store),
        )
        .route(
            "/profile-descs/:id",
            get(handlers::profile_desc::show)
                .put(handlers::profile_desc::update)
                .delete(handlers::profile_desc::destroy),
        )
        // Link routes
        .route(
            "/links",
            get(handlers::link::index).post(handlers::link::store),
        )
        .route(
            "/links/:id",
            get(handlers::link::show)
                .put(handlers::link::update)
                .delete(handlers::link::destroy),
        )
        // Incoming letter workflow
        .route(
            "/surat-requests",
            get(handlers::surat_request::index)
                .post(handlers::surat_request::store)
                .layer(upload_limit.clone()),
        )
        .route(
            "/surat-requests/:id/assign",
            patch(handlers::surat_request::assign),
        )
        .route(
            "/my-dispositions",
            get(handlers::surat_request::my_dispositions),
        )
        .route(
            "/surat-dispositions/:id/status",
            patch(handlers::surat_request::update_status),
        )
        // Outgoing letters
        .route(
            "/surat-outgoing",
            get(handlers::surat_outgoing::index)
                .post(handlers::surat_outgoing::store)
                .layer(upload_limit.clone()),
        )
        .route(
            "/surat-outgoing/:id",
            get(handlers::surat_outgoing::show)
                .put(handlers::surat_outgoing::update)
                .delete(handlers::surat_outgoing::destroy)
                .layer(upload_limit.clone()),
        )
        // Stored files
        .route("/files/*path", get(handlers::file::show));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::message("Not Found")))
}
