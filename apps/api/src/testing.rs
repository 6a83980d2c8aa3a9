//! In-memory stand-ins for the database and the bucket, used by unit and route tests.
//!
//! `MemoryDb` implements both DAO traits over one set of tables and reproduces the
//! integrity rules the migrations declare (unique keys, foreign keys, checks), so
//! conflicts surface as the same `AppError::Conflict` the Postgres DAOs produce.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::auth::TokenService;
use crate::config::Config;
use crate::dao::{
    ApplicantRow, CredentialsRow, JobAssignmentRow, JobDao, JobDetailsRow, JobRequestRow, JobRow,
    JobStatusRow, JobSummaryRow, NewJob, NewRating, NewUser, ProfileEdit, ProfileRow, RatingRow,
    SecurityRow, StudentRequestRow, UserDao, UserInfoRow, UserRow,
};
use crate::errors::AppError;
use crate::models::{JobStatus, RequestState};
use crate::state::AppState;
use crate::storage::ObjectStore;

pub const TEST_SECRET: &str = "test-secret";

// ────────────────────────────────────────────────────────────────────────────
// Tables
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct UserRecord {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    account_type: i16,
    q_type1: String,
    q_type2: String,
    ans1_hash: String,
    ans2_hash: String,
    about: Option<String>,
    address_id: Option<i32>,
    image_key: Option<String>,
    is_deleted: bool,
}

#[derive(Debug, Clone)]
struct AddressRecord {
    street: String,
    city: String,
    zipcode: String,
}

#[derive(Debug, Clone)]
struct JobRecord {
    id: i32,
    owner_id: i32,
    title: String,
    description: String,
    price: String,
    category: i16,
    address_id: i32,
    days: i16,
    status: i16,
    student_id: Option<i32>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RequestRecord {
    id: i32,
    job_id: i32,
    student_id: i32,
    state: i16,
}

#[derive(Debug, Clone)]
struct RatingRecord {
    id: i32,
    job_id: i32,
    user_id: i32,
    value: i16,
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    addresses: BTreeMap<i32, AddressRecord>,
    users: BTreeMap<i32, UserRecord>,
    jobs: BTreeMap<i32, JobRecord>,
    requests: Vec<RequestRecord>,
    ratings: Vec<RatingRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_address(&mut self, street: &str, city: &str, zipcode: &str) -> i32 {
        let id = self.next_id();
        self.addresses.insert(
            id,
            AddressRecord {
                street: street.to_string(),
                city: city.to_string(),
                zipcode: zipcode.to_string(),
            },
        );
        id
    }

    fn require_user(&self, table: &str, column: &str, user_id: i32) -> Result<(), AppError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(fk_violation(table, column))
        }
    }

    fn require_job(&self, table: &str, job_id: i32) -> Result<(), AppError> {
        if self.jobs.contains_key(&job_id) {
            Ok(())
        } else {
            Err(fk_violation(table, "job_id"))
        }
    }
}

fn unique_violation(constraint: &str) -> AppError {
    AppError::Conflict(format!(
        "duplicate key value violates unique constraint \"{constraint}\""
    ))
}

fn fk_violation(table: &str, column: &str) -> AppError {
    AppError::Conflict(format!(
        "insert or update on table \"{table}\" violates foreign key constraint \"{table}_{column}_fkey\""
    ))
}

fn check_violation(table: &str, constraint: &str) -> AppError {
    AppError::Conflict(format!(
        "new row for relation \"{table}\" violates check constraint \"{constraint}\""
    ))
}

/// Mirrors storing into `NUMERIC(10, 2)` and reading back `::text`. Rejections carry
/// Postgres' text (22P02, 22003), which `From<sqlx::Error>` turns into conflicts.
fn numeric_text(price: &str) -> Result<String, AppError> {
    let value = price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| AppError::Conflict(format!("invalid input syntax for type numeric: \"{price}\"")))?;
    let cents = (value * 100.0).round();
    if cents.abs() >= 1e10 {
        return Err(AppError::Conflict("numeric field overflow".to_string()));
    }
    Ok(format!("{:.2}", cents / 100.0))
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryDb
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl MemoryDb {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("tables lock poisoned")
    }

    /// Inserts a user without going through hashing. Returns the new id.
    pub fn seed_user(&self, first_name: &str, last_name: &str, email: &str, account_type: i16) -> i32 {
        let mut t = self.tables();
        let id = t.next_id();
        t.users.insert(
            id,
            UserRecord {
                id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password_hash: "unset".to_string(),
                account_type,
                q_type1: "1".to_string(),
                q_type2: "2".to_string(),
                ans1_hash: "unset".to_string(),
                ans2_hash: "unset".to_string(),
                about: None,
                address_id: None,
                image_key: None,
                is_deleted: false,
            },
        );
        id
    }

    pub fn request_state(&self, request_id: i32) -> Option<i16> {
        self.tables()
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .map(|r| r.state)
    }

    pub fn is_deleted(&self, user_id: i32) -> Option<bool> {
        self.tables().users.get(&user_id).map(|u| u.is_deleted)
    }
}

fn user_row(u: &UserRecord) -> UserRow {
    UserRow {
        user_id: u.id,
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        email: u.email.clone(),
        account_type: u.account_type,
        about: u.about.clone(),
    }
}

fn job_row(j: &JobRecord) -> JobRow {
    JobRow {
        job_id: j.id,
        owner_id: j.owner_id,
        title: j.title.clone(),
        description: j.description.clone(),
        price: j.price.clone(),
        category: j.category,
        days: j.days,
        status: j.status,
    }
}

#[async_trait]
impl UserDao for MemoryDb {
    async fn create_user(&self, user: &NewUser) -> Result<UserRow, AppError> {
        let mut t = self.tables();
        if t.users.values().any(|u| u.email == user.email) {
            return Err(unique_violation("users_email_key"));
        }
        if !(1..=3).contains(&user.account_type) {
            return Err(check_violation("users", "users_account_type_check"));
        }
        let id = t.next_id();
        let record = UserRecord {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            account_type: user.account_type,
            q_type1: user.q_type1.clone(),
            q_type2: user.q_type2.clone(),
            ans1_hash: user.ans1_hash.clone(),
            ans2_hash: user.ans2_hash.clone(),
            about: None,
            address_id: None,
            image_key: None,
            is_deleted: false,
        };
        let row = user_row(&record);
        t.users.insert(id, record);
        Ok(row)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<CredentialsRow>, AppError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email)
            .map(|u| CredentialsRow {
                user_id: u.id,
                email: u.email.clone(),
                account_type: u.account_type,
                password_hash: u.password_hash.clone(),
                is_deleted: u.is_deleted,
            }))
    }

    async fn list_by_type(&self, account_type: i16) -> Result<Vec<UserRow>, AppError> {
        Ok(self
            .tables()
            .users
            .values()
            .filter(|u| u.account_type == account_type && !u.is_deleted)
            .map(user_row)
            .collect())
    }

    async fn edit_user(&self, edit: &ProfileEdit) -> Result<Option<ProfileRow>, AppError> {
        let mut t = self.tables();
        let address_id = t.insert_address(&edit.street, &edit.city, &edit.zipcode);
        let Some(user) = t.users.get_mut(&edit.user_id).filter(|u| !u.is_deleted) else {
            return Ok(None);
        };
        user.first_name = edit.first_name.clone();
        user.last_name = edit.last_name.clone();
        user.about = Some(edit.about.clone());
        user.address_id = Some(address_id);
        if let Some(key) = &edit.image_key {
            user.image_key = Some(key.clone());
        }
        Ok(Some(ProfileRow {
            user_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            about: user.about.clone(),
            address_id: user.address_id,
            image_key: user.image_key.clone(),
        }))
    }

    async fn find_security(&self, email: &str) -> Result<Option<SecurityRow>, AppError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email && !u.is_deleted)
            .map(|u| SecurityRow {
                user_id: u.id,
                q_type1: u.q_type1.clone(),
                q_type2: u.q_type2.clone(),
                ans1_hash: u.ans1_hash.clone(),
                ans2_hash: u.ans2_hash.clone(),
            }))
    }

    async fn update_password(&self, user_id: i32, password_hash: &str) -> Result<Option<i32>, AppError> {
        let mut t = self.tables();
        Ok(t.users
            .get_mut(&user_id)
            .filter(|u| !u.is_deleted)
            .map(|u| {
                u.password_hash = password_hash.to_string();
                u.id
            }))
    }

    async fn user_info(&self, user_id: i32) -> Result<Option<UserInfoRow>, AppError> {
        let t = self.tables();
        let Some(u) = t.users.get(&user_id).filter(|u| !u.is_deleted) else {
            return Ok(None);
        };
        let address = u.address_id.and_then(|id| t.addresses.get(&id));
        let values: Vec<f64> = t
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| f64::from(r.value))
            .collect();
        let rating = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        Ok(Some(UserInfoRow {
            user_id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            account_type: u.account_type,
            about: u.about.clone(),
            image_key: u.image_key.clone(),
            street: address.map(|a| a.street.clone()),
            city: address.map(|a| a.city.clone()),
            zipcode: address.map(|a| a.zipcode.clone()),
            rating,
        }))
    }

    async fn soft_delete(&self, user_id: i32) -> Result<Option<i32>, AppError> {
        let mut t = self.tables();
        Ok(t.users
            .get_mut(&user_id)
            .filter(|u| !u.is_deleted)
            .map(|u| {
                u.is_deleted = true;
                u.id
            }))
    }
}

#[async_trait]
impl JobDao for MemoryDb {
    async fn create_job(&self, job: &NewJob) -> Result<JobRow, AppError> {
        let mut t = self.tables();
        t.require_user("jobs", "owner_id", job.owner_id)?;
        if !(1..=8).contains(&job.category) {
            return Err(check_violation("jobs", "jobs_category_check"));
        }
        let price = numeric_text(&job.price)?;
        let address_id = t.insert_address(&job.street, &job.city, &job.zipcode);
        let id = t.next_id();
        let record = JobRecord {
            id,
            owner_id: job.owner_id,
            title: job.title.clone(),
            description: job.description.clone(),
            price,
            category: job.category,
            address_id,
            days: job.days,
            status: JobStatus::Posted.code(),
            student_id: None,
            created_at: Utc::now(),
        };
        let row = job_row(&record);
        t.jobs.insert(id, record);
        Ok(row)
    }

    async fn job_details(&self, job_id: i32) -> Result<Option<JobDetailsRow>, AppError> {
        let t = self.tables();
        let Some(j) = t.jobs.get(&job_id) else {
            return Ok(None);
        };
        let (Some(address), Some(owner)) = (t.addresses.get(&j.address_id), t.users.get(&j.owner_id))
        else {
            return Ok(None);
        };
        let student = j.student_id.and_then(|id| t.users.get(&id));
        Ok(Some(JobDetailsRow {
            job_id: j.id,
            title: j.title.clone(),
            description: j.description.clone(),
            price: j.price.clone(),
            category: j.category,
            days: j.days,
            status: j.status,
            created_at: j.created_at,
            street: address.street.clone(),
            city: address.city.clone(),
            zipcode: address.zipcode.clone(),
            owner_id: owner.id,
            owner_name: owner.first_name.clone(),
            owner_last: owner.last_name.clone(),
            student_id: j.student_id,
            student_name: student.map(|s| s.first_name.clone()),
            student_last: student.map(|s| s.last_name.clone()),
        }))
    }

    async fn jobs_by_status(&self, status: i16) -> Result<Vec<JobSummaryRow>, AppError> {
        let t = self.tables();
        Ok(t.jobs
            .values()
            .rev()
            .filter(|j| j.status == status)
            .map(|j| JobSummaryRow {
                job_id: j.id,
                owner_id: j.owner_id,
                title: j.title.clone(),
                price: j.price.clone(),
                category: j.category,
                city: t
                    .addresses
                    .get(&j.address_id)
                    .map(|a| a.city.clone())
                    .unwrap_or_default(),
                days: j.days,
                status: j.status,
                student_id: j.student_id,
            })
            .collect())
    }

    async fn set_status(&self, job_id: i32, status: i16) -> Result<Option<JobStatusRow>, AppError> {
        if !(1..=5).contains(&status) {
            return Err(check_violation("jobs", "jobs_status_check"));
        }
        let mut t = self.tables();
        Ok(t.jobs.get_mut(&job_id).map(|j| {
            j.status = status;
            JobStatusRow {
                job_id: j.id,
                status: j.status,
            }
        }))
    }

    async fn assign_student(&self, job_id: i32, student_id: i32) -> Result<Option<JobAssignmentRow>, AppError> {
        let mut t = self.tables();
        if !t.jobs.contains_key(&job_id) {
            return Ok(None);
        }
        t.require_user("jobs", "student_id", student_id)?;
        for request in t.requests.iter_mut().filter(|r| r.job_id == job_id) {
            if request.state == RequestState::Open.code() {
                request.state = RequestState::Closed.code();
            }
        }
        Ok(t.jobs.get_mut(&job_id).map(|j| {
            j.student_id = Some(student_id);
            j.status = JobStatus::InProcess.code();
            JobAssignmentRow {
                job_id: j.id,
                student_id: j.student_id,
                status: j.status,
            }
        }))
    }

    async fn add_request(&self, job_id: i32, student_id: i32) -> Result<JobRequestRow, AppError> {
        let mut t = self.tables();
        t.require_job("job_requests", job_id)?;
        t.require_user("job_requests", "student_id", student_id)?;
        if t
            .requests
            .iter()
            .any(|r| r.job_id == job_id && r.student_id == student_id)
        {
            return Err(unique_violation("job_requests_job_student_key"));
        }
        let record = RequestRecord {
            id: t.next_id(),
            job_id,
            student_id,
            state: RequestState::Open.code(),
        };
        t.requests.push(record.clone());
        Ok(JobRequestRow {
            request_id: record.id,
            job_id: record.job_id,
            student_id: record.student_id,
            state: record.state,
        })
    }

    async fn requests_for_job(&self, job_id: i32) -> Result<Vec<ApplicantRow>, AppError> {
        let t = self.tables();
        Ok(t.requests
            .iter()
            .filter(|r| r.job_id == job_id)
            .filter_map(|r| {
                let student = t.users.get(&r.student_id).filter(|u| !u.is_deleted)?;
                Some(ApplicantRow {
                    request_id: r.id,
                    student_id: r.student_id,
                    first_name: student.first_name.clone(),
                    last_name: student.last_name.clone(),
                    email: student.email.clone(),
                    state: r.state,
                })
            })
            .collect())
    }

    async fn requests_for_student(&self, student_id: i32) -> Result<Vec<StudentRequestRow>, AppError> {
        let t = self.tables();
        Ok(t.requests
            .iter()
            .rev()
            .filter(|r| r.student_id == student_id)
            .filter_map(|r| {
                let job = t.jobs.get(&r.job_id)?;
                Some(StudentRequestRow {
                    request_id: r.id,
                    job_id: r.job_id,
                    title: job.title.clone(),
                    price: job.price.clone(),
                    status: job.status,
                    state: r.state,
                })
            })
            .collect())
    }

    async fn add_rating(&self, rating: &NewRating) -> Result<RatingRow, AppError> {
        let mut t = self.tables();
        t.require_job("ratings", rating.job_id)?;
        t.require_user("ratings", "user_id", rating.user_id)?;
        if !(1..=5).contains(&rating.value) {
            return Err(check_violation("ratings", "ratings_value_check"));
        }
        if t
            .ratings
            .iter()
            .any(|r| r.job_id == rating.job_id && r.user_id == rating.user_id)
        {
            return Err(unique_violation("ratings_job_user_key"));
        }
        let record = RatingRecord {
            id: t.next_id(),
            job_id: rating.job_id,
            user_id: rating.user_id,
            value: rating.value,
        };
        t.ratings.push(record.clone());
        Ok(RatingRow {
            rating_id: record.id,
            job_id: record.job_id,
            user_id: record.user_id,
            value: record.value,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ────────────────────────────────────────────────────────────────────────────

/// Bucket stand-in. Presigned URLs look like `memory://{key}?expires={secs}`.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, (Bytes, String)>>,
    failing: bool,
}

impl MemoryStore {
    /// A store whose every call fails.
    pub fn failing() -> Self {
        Self {
            objects: Mutex::default(),
            failing: true,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .expect("objects lock poisoned")
            .contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        if self.failing {
            bail!("bucket unavailable");
        }
        self.objects
            .lock()
            .expect("objects lock poisoned")
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn presigned_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        if self.failing {
            bail!("bucket unavailable");
        }
        Ok(format!("memory://{key}?expires={}", expires_in.as_secs()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AppState
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret_key: TEST_SECRET.to_string(),
        jwt_access_token_expires_days: 1,
        aws_bucket_name: "test-bucket".to_string(),
        aws_region: "us-east-1".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        aws_upload_folder: "uploads".to_string(),
        aws_url_expire_seconds: 60,
        s3_endpoint: None,
        cookie_secure: false,
        contract_logo_path: None,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// State wired to a fresh `MemoryDb` and `MemoryStore`; both are handed back for
/// seeding and inspection.
pub fn test_state() -> (AppState, Arc<MemoryDb>, Arc<MemoryStore>) {
    let db = Arc::new(MemoryDb::default());
    let store = Arc::new(MemoryStore::default());
    let config = test_config();
    let state = AppState {
        users: db.clone(),
        jobs: db.clone(),
        storage: store.clone(),
        tokens: TokenService::new(
            &config.jwt_secret_key,
            chrono::Duration::days(config.jwt_access_token_expires_days),
        ),
        config,
        contract_logo: None,
    };
    (state, db, store)
}
