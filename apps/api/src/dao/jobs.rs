use async_trait::async_trait;
use sqlx::PgPool;

use crate::dao::{
    ApplicantRow, JobAssignmentRow, JobDao, JobDetailsRow, JobRequestRow, JobRow, JobStatusRow,
    JobSummaryRow, NewJob, NewRating, RatingRow, StudentRequestRow,
};
use crate::errors::AppError;
use crate::models::{JobStatus, RequestState};

/// `JobDao` over PostgreSQL.
#[derive(Clone)]
pub struct PgJobDao {
    pool: PgPool,
}

impl PgJobDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobDao for PgJobDao {
    async fn create_job(&self, job: &NewJob) -> Result<JobRow, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            WITH addr AS (
                INSERT INTO addresses (street, city, zipcode)
                VALUES ($6, $7, $8)
                RETURNING id
            )
            INSERT INTO jobs (owner_id, title, description, price, category, address_id, days)
            SELECT $1, $2, $3, $4::NUMERIC, $5, addr.id, $9
            FROM addr
            RETURNING id AS job_id, owner_id, title, description, price::TEXT AS price,
                      category, days, status
            "#,
        )
        .bind(job.owner_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.price)
        .bind(job.category)
        .bind(&job.street)
        .bind(&job.city)
        .bind(&job.zipcode)
        .bind(job.days)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn job_details(&self, job_id: i32) -> Result<Option<JobDetailsRow>, AppError> {
        Ok(sqlx::query_as::<_, JobDetailsRow>(
            r#"
            SELECT j.id AS job_id, j.title, j.description, j.price::TEXT AS price,
                   j.category, j.days, j.status, j.created_at,
                   a.street, a.city, a.zipcode,
                   j.owner_id, o.first_name AS owner_name, o.last_name AS owner_last,
                   j.student_id, s.first_name AS student_name, s.last_name AS student_last
            FROM jobs j
            JOIN addresses a ON a.id = j.address_id
            JOIN users o ON o.id = j.owner_id
            LEFT JOIN users s ON s.id = j.student_id
            WHERE j.id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn jobs_by_status(&self, status: i16) -> Result<Vec<JobSummaryRow>, AppError> {
        Ok(sqlx::query_as::<_, JobSummaryRow>(
            r#"
            SELECT j.id AS job_id, j.owner_id, j.title, j.price::TEXT AS price, j.category,
                   a.city, j.days, j.status, j.student_id
            FROM jobs j
            JOIN addresses a ON a.id = j.address_id
            WHERE j.status = $1
            ORDER BY j.created_at DESC, j.id DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_status(&self, job_id: i32, status: i16) -> Result<Option<JobStatusRow>, AppError> {
        Ok(sqlx::query_as::<_, JobStatusRow>(
            "UPDATE jobs SET status = $2 WHERE id = $1 RETURNING id AS job_id, status",
        )
        .bind(job_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn assign_student(&self, job_id: i32, student_id: i32) -> Result<Option<JobAssignmentRow>, AppError> {
        Ok(sqlx::query_as::<_, JobAssignmentRow>(
            r#"
            WITH closed AS (
                UPDATE job_requests
                SET state = $4
                WHERE job_id = $1 AND state = $5
            )
            UPDATE jobs
            SET student_id = $2, status = $3
            WHERE id = $1
            RETURNING id AS job_id, student_id, status
            "#,
        )
        .bind(job_id)
        .bind(student_id)
        .bind(JobStatus::InProcess.code())
        .bind(RequestState::Closed.code())
        .bind(RequestState::Open.code())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn add_request(&self, job_id: i32, student_id: i32) -> Result<JobRequestRow, AppError> {
        Ok(sqlx::query_as::<_, JobRequestRow>(
            r#"
            INSERT INTO job_requests (job_id, student_id, state)
            VALUES ($1, $2, $3)
            RETURNING id AS request_id, job_id, student_id, state
            "#,
        )
        .bind(job_id)
        .bind(student_id)
        .bind(RequestState::Open.code())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn requests_for_job(&self, job_id: i32) -> Result<Vec<ApplicantRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicantRow>(
            r#"
            SELECT r.id AS request_id, r.student_id, u.first_name, u.last_name, u.email, r.state
            FROM job_requests r
            JOIN users u ON u.id = r.student_id
            WHERE r.job_id = $1 AND NOT u.is_deleted
            ORDER BY r.created_at, r.id
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn requests_for_student(&self, student_id: i32) -> Result<Vec<StudentRequestRow>, AppError> {
        Ok(sqlx::query_as::<_, StudentRequestRow>(
            r#"
            SELECT r.id AS request_id, r.job_id, j.title, j.price::TEXT AS price, j.status, r.state
            FROM job_requests r
            JOIN jobs j ON j.id = r.job_id
            WHERE r.student_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn add_rating(&self, rating: &NewRating) -> Result<RatingRow, AppError> {
        Ok(sqlx::query_as::<_, RatingRow>(
            r#"
            INSERT INTO ratings (job_id, user_id, value)
            VALUES ($1, $2, $3)
            RETURNING id AS rating_id, job_id, user_id, value
            "#,
        )
        .bind(rating.job_id)
        .bind(rating.user_id)
        .bind(rating.value)
        .fetch_one(&self.pool)
        .await?)
    }
}
