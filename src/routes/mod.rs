pub mod admin;
pub mod applications;
pub mod auth;
pub mod docs;
pub mod health;
pub mod jobs;
pub mod recruiter;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    auth::require_admin,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Largest accepted request body: the 10 MiB resume ceiling plus multipart framing.
const BODY_LIMIT: usize = 12 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let public_api = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/admin/login", post(admin::operator_login))
        .layer(from_fn_with_state(
            RateLimiter::new("public", config.public_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route("/api/admin/overview", get(admin::overview))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id", delete(admin::delete_user))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let api = Router::new()
        .route("/api/auth/me", get(auth::me).patch(auth::update_me))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/jobs/:id",
            get(jobs::get_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/api/jobs/:id/close", post(jobs::close_job))
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::apply),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::update_status),
        )
        .route("/api/applications/:id/history", get(applications::history))
        .route("/api/recruiter/jobs", get(recruiter::job_stats))
        .route(
            "/api/recruiter/applications/stream",
            get(recruiter::application_stream),
        )
        .route("/api/uploads", post(uploads::upload))
        .merge(admin_api)
        .layer(from_fn_with_state(
            RateLimiter::new("api", config.api_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(docs::openapi_json))
        .merge(public_api)
        .merge(api)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
