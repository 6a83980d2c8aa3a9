//! Data-access objects.
//!
//! One parameterized statement per call, no transactions, no caching. Rows come back
//! typed; controllers decide how they are presented. Integrity violations surface as
//! `AppError::Conflict` through `From<sqlx::Error>`.

pub mod jobs;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::errors::AppError;

pub use jobs::PgJobDao;
pub use users::PgUserDao;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub account_type: i16,
    pub q_type1: String,
    pub q_type2: String,
    pub ans1_hash: String,
    pub ans2_hash: String,
}

#[derive(Debug, Clone)]
pub struct ProfileEdit {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub about: String,
    pub street: String,
    pub city: String,
    pub zipcode: String,
    /// New picture key; `None` keeps the current one.
    pub image_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    /// Decimal string without thousands separators.
    pub price: String,
    pub category: i16,
    pub street: String,
    pub city: String,
    pub zipcode: String,
    pub days: i16,
}

#[derive(Debug, Clone, Copy)]
pub struct NewRating {
    pub job_id: i32,
    pub user_id: i32,
    pub value: i16,
}

// ────────────────────────────────────────────────────────────────────────────
// Rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRow {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub account_type: i16,
    pub about: Option<String>,
}

/// Login lookup. Soft-deleted users are included so the controller can refuse them.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialsRow {
    pub user_id: i32,
    pub email: String,
    pub account_type: i16,
    pub password_hash: String,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProfileRow {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub about: Option<String>,
    pub address_id: Option<i32>,
    pub image_key: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SecurityRow {
    pub user_id: i32,
    pub q_type1: String,
    pub q_type2: String,
    pub ans1_hash: String,
    pub ans2_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserInfoRow {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: i16,
    pub about: Option<String>,
    pub image_key: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobRow {
    pub job_id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: i16,
    pub days: i16,
    pub status: i16,
}

#[derive(Debug, Clone, FromRow)]
pub struct JobDetailsRow {
    pub job_id: i32,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: i16,
    pub days: i16,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub street: String,
    pub city: String,
    pub zipcode: String,
    pub owner_id: i32,
    pub owner_name: String,
    pub owner_last: String,
    pub student_id: Option<i32>,
    pub student_name: Option<String>,
    pub student_last: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobSummaryRow {
    pub job_id: i32,
    pub owner_id: i32,
    pub title: String,
    pub price: String,
    pub category: i16,
    pub city: String,
    pub days: i16,
    pub status: i16,
    pub student_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobStatusRow {
    pub job_id: i32,
    pub status: i16,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobAssignmentRow {
    pub job_id: i32,
    pub student_id: Option<i32>,
    pub status: i16,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobRequestRow {
    pub request_id: i32,
    pub job_id: i32,
    pub student_id: i32,
    pub state: i16,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantRow {
    pub request_id: i32,
    pub student_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub state: i16,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentRequestRow {
    pub request_id: i32,
    pub job_id: i32,
    pub title: String,
    pub price: String,
    pub status: i16,
    pub state: i16,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RatingRow {
    pub rating_id: i32,
    pub job_id: i32,
    pub user_id: i32,
    pub value: i16,
}

// ────────────────────────────────────────────────────────────────────────────
// Traits
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait UserDao: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<UserRow, AppError>;

    async fn find_credentials(&self, email: &str) -> Result<Option<CredentialsRow>, AppError>;

    async fn list_by_type(&self, account_type: i16) -> Result<Vec<UserRow>, AppError>;

    async fn edit_user(&self, edit: &ProfileEdit) -> Result<Option<ProfileRow>, AppError>;

    async fn find_security(&self, email: &str) -> Result<Option<SecurityRow>, AppError>;

    /// Returns the id of the updated user, `None` if no live user matched.
    async fn update_password(&self, user_id: i32, password_hash: &str) -> Result<Option<i32>, AppError>;

    async fn user_info(&self, user_id: i32) -> Result<Option<UserInfoRow>, AppError>;

    /// Flags the user as deleted. Returns the id, `None` if no live user matched.
    async fn soft_delete(&self, user_id: i32) -> Result<Option<i32>, AppError>;
}

#[async_trait]
pub trait JobDao: Send + Sync {
    async fn create_job(&self, job: &NewJob) -> Result<JobRow, AppError>;

    async fn job_details(&self, job_id: i32) -> Result<Option<JobDetailsRow>, AppError>;

    async fn jobs_by_status(&self, status: i16) -> Result<Vec<JobSummaryRow>, AppError>;

    async fn set_status(&self, job_id: i32, status: i16) -> Result<Option<JobStatusRow>, AppError>;

    /// Assigns the student, moves the job to in-process and closes its open requests.
    async fn assign_student(&self, job_id: i32, student_id: i32) -> Result<Option<JobAssignmentRow>, AppError>;

    async fn add_request(&self, job_id: i32, student_id: i32) -> Result<JobRequestRow, AppError>;

    async fn requests_for_job(&self, job_id: i32) -> Result<Vec<ApplicantRow>, AppError>;

    async fn requests_for_student(&self, student_id: i32) -> Result<Vec<StudentRequestRow>, AppError>;

    async fn add_rating(&self, rating: &NewRating) -> Result<RatingRow, AppError>;
}
