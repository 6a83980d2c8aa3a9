use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::contract::{render_contract, ContractDetails};
use crate::controllers::{created, field, ok, require_id, Reply};
use crate::dao::{
    ApplicantRow, JobAssignmentRow, JobRequestRow, JobRow, JobStatusRow, JobSummaryRow, NewJob,
    NewRating, RatingRow, StudentRequestRow,
};
use crate::errors::AppError;
use crate::models::job::{clean_price, display_price, format_date, DAY_KEYS};
use crate::models::{JobCategory, JobStatus, WeekDays};
use crate::payload::{self, Payload};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Serialize)]
pub struct JobDetails {
    pub job_id: i32,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: i16,
    pub category_name: Option<&'static str>,
    pub days: Vec<&'static str>,
    pub status: i16,
    pub date: String,
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

#[derive(Debug, Serialize)]
pub struct JobContract {
    pub job_id: i32,
    /// Base64-encoded PDF.
    pub contract: String,
}

pub struct JobController<'a> {
    state: &'a AppState,
}

impl<'a> JobController<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn create_job(&self, data: &Payload) -> Reply<JobRow> {
        let category = payload::integer(data, "categories")
            .and_then(JobCategory::from_code)
            .ok_or_else(|| AppError::Validation("Valid categories: 1, 2, 3, 4, 5, 6, 7, 8".to_string()))?;

        let mut flags = [false; 7];
        for (flag, key) in flags.iter_mut().zip(DAY_KEYS) {
            *flag = payload::flag(data, key);
        }

        let job = NewJob {
            owner_id: require_id(data, "user_id")?,
            title: field(data, "title"),
            description: field(data, "description"),
            price: clean_price(&field(data, "price")),
            category: category.code(),
            street: field(data, "street"),
            city: field(data, "city"),
            zipcode: field(data, "zipcode"),
            days: WeekDays::from_flags(flags).mask(),
        };

        let row = self.state.jobs.create_job(&job).await?;
        info!("Job {} posted by user {}", row.job_id, row.owner_id);
        created(row)
    }

    pub async fn get_job_details(&self, job_id: i32) -> Reply<JobDetails> {
        let row = self
            .state
            .jobs
            .job_details(job_id)
            .await?
            .ok_or_else(|| job_not_found(job_id))?;

        ok(JobDetails {
            job_id: row.job_id,
            title: row.title,
            description: row.description,
            price: display_price(&row.price),
            category: row.category,
            category_name: JobCategory::from_code(i64::from(row.category)).map(JobCategory::label),
            days: WeekDays::from_mask(row.days).names(),
            status: row.status,
            date: format_date(row.created_at),
            street: row.street,
            city: row.city,
            zipcode: row.zipcode,
            owner_id: row.owner_id,
            owner_name: row.owner_name,
            owner_last: row.owner_last,
            student_id: row.student_id,
            student_name: row.student_name,
            student_last: row.student_last,
        })
    }

    pub async fn get_job_list_by_status(&self, status: JobStatus) -> Reply<Vec<JobSummaryRow>> {
        let jobs = self
            .state
            .jobs
            .jobs_by_status(status.code())
            .await?
            .into_iter()
            .map(|mut job| {
                job.price = display_price(&job.price);
                job
            })
            .collect();
        ok(jobs)
    }

    pub async fn set_job_status(&self, job_id: i32, data: &Payload) -> Reply<JobStatusRow> {
        let status = JobStatus::from_code_str(field(data, "status").trim())
            .ok_or_else(|| AppError::Validation(validation::valid_status_message()))?;
        let row = self
            .state
            .jobs
            .set_status(job_id, status.code())
            .await?
            .ok_or_else(|| job_not_found(job_id))?;
        info!("Job {job_id} moved to {}", status.label());
        ok(row)
    }

    /// Assigns the student and closes the job's other open requests.
    pub async fn set_job_worker(&self, data: &Payload) -> Reply<JobAssignmentRow> {
        let job_id = require_id(data, "job_id")?;
        let student_id = require_id(data, "student_id")?;
        let row = self
            .state
            .jobs
            .assign_student(job_id, student_id)
            .await?
            .ok_or_else(|| job_not_found(job_id))?;
        info!("Job {job_id} assigned to student {student_id}");
        ok(row)
    }

    pub async fn add_job_request(&self, data: &Payload) -> Reply<JobRequestRow> {
        let job_id = require_id(data, "job_id")?;
        let student_id = require_id(data, "student_id")?;
        let row = self.state.jobs.add_request(job_id, student_id).await?;
        info!("Student {student_id} requested job {job_id}");
        created(row)
    }

    pub async fn get_requests_list(&self, job_id: i32) -> Reply<Vec<ApplicantRow>> {
        ok(self.state.jobs.requests_for_job(job_id).await?)
    }

    pub async fn get_student_requests_list(&self, student_id: i32) -> Reply<Vec<StudentRequestRow>> {
        let requests = self
            .state
            .jobs
            .requests_for_student(student_id)
            .await?
            .into_iter()
            .map(|mut r| {
                r.price = display_price(&r.price);
                r
            })
            .collect();
        ok(requests)
    }

    pub async fn add_job_ratings(&self, job_id: i32, data: &Payload) -> Reply<RatingRow> {
        let value = payload::integer(data, "value")
            .and_then(|v| i16::try_from(v).ok())
            .ok_or_else(|| AppError::Validation("Rate value must be in the range of 1 to 5.".to_string()))?;
        let rating = NewRating {
            job_id,
            user_id: require_id(data, "user_id")?,
            value,
        };
        let row = self.state.jobs.add_rating(&rating).await?;
        info!("User {} rated {} for job {job_id}", row.user_id, row.value);
        created(row)
    }

    /// Renders the two-page agreement between the job's owner and its assigned student.
    pub async fn get_contract(&self, job_id: i32) -> Reply<JobContract> {
        let row = self
            .state
            .jobs
            .job_details(job_id)
            .await?
            .ok_or_else(|| job_not_found(job_id))?;

        let (Some(student_name), Some(student_last)) = (row.student_name, row.student_last) else {
            return Err(AppError::Validation("Job has no assigned student".to_string()));
        };

        let details = ContractDetails {
            owner_name: row.owner_name,
            owner_last: row.owner_last,
            student_name,
            student_last,
            title: row.title,
            description: row.description,
            street: row.street,
            city: row.city,
            zipcode: row.zipcode,
            price: display_price(&row.price),
        };
        let contract = render_contract(
            &details,
            self.state.contract_logo.as_deref(),
            Utc::now().date_naive(),
        )?;
        info!("Generated contract for job {job_id}");
        ok(JobContract { job_id, contract })
    }
}

fn job_not_found(job_id: i32) -> AppError {
    AppError::NotFound(format!("Job {job_id} not found"))
}
