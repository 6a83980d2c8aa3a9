use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use bytes::Bytes;

use crate::controllers::JobController;
use crate::errors::AppError;
use crate::models::JobStatus;
use crate::payload::{self, Payload};
use crate::state::AppState;
use crate::validation;

/// Reads the body and requires a single integer id field, as the list routes do.
fn body_id(body: &[u8], key: &str) -> Result<i32, AppError> {
    let data = payload::from_json_body(body)
        .filter(|p| p.contains_key(key))
        .ok_or_else(|| AppError::Validation(validation::required_param_message(key)))?;
    payload::id(&data, key).ok_or_else(|| AppError::Validation(format!("{key} must be an integer")))
}

fn checked(body: &[u8], check: fn(Option<&Payload>) -> validation::Validation) -> Result<Payload, AppError> {
    let data = payload::from_json_body(body);
    check(data.as_ref()).map_err(AppError::Validation)?;
    Ok(data.unwrap_or_default())
}

/// POST /api/create_job
pub async fn create_job(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let data = checked(&body, validation::validate_create_job)?;
    JobController::new(&state).create_job(&data).await
}

/// GET /api/job_details/:id
pub async fn job_details(State(state): State<AppState>, Path(job_id): Path<i32>) -> Result<impl IntoResponse, AppError> {
    JobController::new(&state).get_job_details(job_id).await
}

/// GET /api/job_contract/:id
pub async fn job_contract(State(state): State<AppState>, Path(job_id): Path<i32>) -> Result<impl IntoResponse, AppError> {
    JobController::new(&state).get_contract(job_id).await
}

/// GET /api/jobs_list/:status
pub async fn jobs_list(State(state): State<AppState>, Path(status): Path<String>) -> Result<impl IntoResponse, AppError> {
    let status = JobStatus::from_code_str(&status)
        .ok_or_else(|| AppError::Validation(validation::valid_status_message()))?;
    JobController::new(&state).get_job_list_by_status(status).await
}

/// PUT /api/job_status/:id
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let data = checked(&body, validation::validate_job_status)?;
    JobController::new(&state).set_job_status(job_id, &data).await
}

/// PUT /api/assign_job
pub async fn assign_job(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let data = checked(&body, validation::validate_assign_job_data)?;
    JobController::new(&state).set_job_worker(&data).await
}

/// POST /api/request_job
pub async fn request_job(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let data = checked(&body, validation::validate_job_requests)?;
    JobController::new(&state).add_job_request(&data).await
}

/// GET /api/job_requests with a JSON body carrying `job_id`.
pub async fn job_requests(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let job_id = body_id(&body, "job_id")?;
    JobController::new(&state).get_requests_list(job_id).await
}

/// GET /api/student_requests with a JSON body carrying `student_id`.
pub async fn student_requests(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let student_id = body_id(&body, "student_id")?;
    JobController::new(&state)
        .get_student_requests_list(student_id)
        .await
}

/// POST /api/rate_job/:id
pub async fn rate_job(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let data = checked(&body, validation::validate_job_rate)?;
    JobController::new(&state).add_job_ratings(job_id, &data).await
}
