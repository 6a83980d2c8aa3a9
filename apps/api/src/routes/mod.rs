pub mod health;
pub mod jobs;
pub mod users;


use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::require_auth;
use crate::state::AppState;

/// Body ceiling for the multipart profile form, picture included.
pub const PROFILE_FORM_LIMIT: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Everything below requires a valid access token (bearer header or cookie)
    let protected = Router::new()
        .route("/api/logout", post(users::logout))
        .route("/api/users", get(users::list_users))
        .route(
            "/api/edit_user/:id",
            put(users::edit_user).layer(DefaultBodyLimit::max(PROFILE_FORM_LIMIT)),
        )
        .route("/api/is_valid_token", get(users::is_valid_token))
        .route("/api/user_info/:id", get(users::user_info))
        .route("/api/delete_user/:id", post(users::delete_user))
        .route("/api/request_job", post(jobs::request_job))
        .route("/api/job_requests", get(jobs::job_requests))
        .route("/api/student_requests", get(jobs::student_requests))
        .route("/api/assign_job", put(jobs::assign_job))
        .route("/api/job_details/:id", get(jobs::job_details))
        .route("/api/job_contract/:id", get(jobs::job_contract))
        .route("/api/jobs_list/:status", get(jobs::jobs_list))
        .route("/api/create_job", post(jobs::create_job))
        .route("/api/job_status/:id", put(jobs::job_status))
        .route("/api/rate_job/:id", post(jobs::rate_job))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/login", post(users::login))
        .route("/api/create_user", post(users::create_user))
        .route(
            "/api/change_password",
            get(users::security_questions).put(users::change_password),
        )
        .merge(protected)
        .with_state(state)
}
