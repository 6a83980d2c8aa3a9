//! Request-shape validation.
//!
//! Every helper returns `Ok(())` or the exact message sent back to the client with a
//! 400. Presence checks always list the full field set in declaration order, no matter
//! which field was missing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::job::clean_price;
use crate::models::{AccountType, JobCategory, JobStatus};
use crate::payload::{self, Payload};

pub type Validation = Result<(), String>;

pub const LOGIN_FIELDS: &[&str] = &["email", "password"];
pub const PASSWORD_FIELDS: &[&str] = &["password", "email"];
pub const USER_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "password",
    "type",
    "q_type1",
    "q_type2",
    "ans1",
    "ans2",
];
pub const ASSIGN_JOB_FIELDS: &[&str] = &["job_id", "student_id"];
pub const JOB_REQUEST_FIELDS: &[&str] = &["job_id", "student_id"];
pub const CREATE_JOB_FIELDS: &[&str] = &[
    "user_id",
    "title",
    "description",
    "price",
    "categories",
    "street",
    "city",
    "zipcode",
    "d",
    "l",
    "m",
    "w",
    "j",
    "v",
    "s",
];
pub const PROFILE_FIELDS: &[&str] = &["first_name", "last_name", "about", "street", "city", "zipcode"];
pub const JOB_STATUS_FIELDS: &[&str] = &["status"];
pub const JOB_RATE_FIELDS: &[&str] = &["user_id", "value"];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static UPR_EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+@upr\.edu$").expect("valid upr regex"));

pub fn required_params_message(expected: &[&str]) -> String {
    format!("The following parameters are required: {}", expected.join(", "))
}

pub fn required_param_message(name: &str) -> String {
    format!("The following parameter is required: {name}")
}

pub fn valid_type_message() -> String {
    "Valid type: 1, 2, and 3".to_string()
}

pub fn valid_status_message() -> String {
    let codes: Vec<String> = JobStatus::ALL.iter().map(|s| s.code().to_string()).collect();
    format!("Valid status: {}", codes.join(", "))
}

/// Fails with the fixed "parameters required" message if `data` is absent or lacks
/// any of `expected`.
pub fn validate_expected_params(expected: &[&str], data: Option<&Payload>) -> Validation {
    require_params(expected, data).map(|_| ())
}

/// Presence check that hands back the payload for the shape checks that follow.
fn require_params<'a>(expected: &[&str], data: Option<&'a Payload>) -> Result<&'a Payload, String> {
    match data {
        Some(data) if expected.iter().all(|param| data.contains_key(*param)) => Ok(data),
        _ => Err(required_params_message(expected)),
    }
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn validate_email_field(data: &Payload) -> Validation {
    let email = payload::text(data, "email").unwrap_or_default();
    if validate_email(&email) {
        Ok(())
    } else {
        Err("Email provided is not valid".to_string())
    }
}

pub fn validate_login_data(data: Option<&Payload>) -> Validation {
    let data = require_params(LOGIN_FIELDS, data)?;
    validate_email_field(data)
}

pub fn validate_password_info(data: Option<&Payload>) -> Validation {
    let data = require_params(PASSWORD_FIELDS, data)?;
    validate_email_field(data)
}

/// Registration payload. Students must use an institutional `upr.edu` address; that
/// rule is checked before the general format so it wins even for malformed input.
pub fn validate_user_info(data: Option<&Payload>) -> Validation {
    let data = require_params(USER_FIELDS, data)?;

    let account_type = payload::integer(data, "type")
        .and_then(AccountType::from_code)
        .ok_or_else(valid_type_message)?;

    let email = payload::text(data, "email").unwrap_or_default();
    if account_type == AccountType::Student && !UPR_EMAIL_RE.is_match(&email) {
        return Err("A upr email is needed to register as student".to_string());
    }

    validate_email_field(data)
}

pub fn validate_assign_job_data(data: Option<&Payload>) -> Validation {
    validate_expected_params(ASSIGN_JOB_FIELDS, data)
}

pub fn validate_job_requests(data: Option<&Payload>) -> Validation {
    validate_expected_params(JOB_REQUEST_FIELDS, data)
}

/// Largest amount `jobs.price NUMERIC(10, 2)` can hold.
pub const MAX_PRICE: f64 = 99_999_999.99;

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn validate_create_job(data: Option<&Payload>) -> Validation {
    let data = require_params(CREATE_JOB_FIELDS, data)?;

    let price_ok = payload::text(data, "price")
        .map(|p| clean_price(&p))
        .and_then(|p| p.parse::<f64>().ok())
        .is_some_and(|p| p.is_finite() && p > 0.0 && round_cents(p) <= MAX_PRICE);
    if !price_ok {
        return Err("Price must be a valid amount".to_string());
    }

    if payload::integer(data, "categories")
        .and_then(JobCategory::from_code)
        .is_none()
    {
        let codes: Vec<String> = JobCategory::ALL
            .iter()
            .map(|c| c.code().to_string())
            .collect();
        return Err(format!("Valid categories: {}", codes.join(", ")));
    }

    Ok(())
}

/// Profile edits arrive as a form; its message carries a trailing period.
pub fn validate_profile_data(data: &Payload) -> Validation {
    if PROFILE_FIELDS.iter().all(|param| data.contains_key(*param)) {
        Ok(())
    } else {
        Err(format!("{}.", required_params_message(PROFILE_FIELDS)))
    }
}

pub fn validate_job_status(data: Option<&Payload>) -> Validation {
    let data = require_params(JOB_STATUS_FIELDS, data)?;
    let status = payload::text(data, "status").unwrap_or_default();
    match JobStatus::from_code_str(status.trim()) {
        Some(_) => Ok(()),
        None => Err(valid_status_message()),
    }
}

pub fn validate_job_rate(data: Option<&Payload>) -> Validation {
    let data = require_params(JOB_RATE_FIELDS, data)?;
    match payload::integer(data, "value") {
        Some(value) if (1..=5).contains(&value) => Ok(()),
        _ => Err("Rate value must be in the range of 1 to 5.".to_string()),
    }
}
