//! Controllers turn a validated payload into one data-access call and shape the
//! returned row into a response body with a status code.

pub mod jobs;
pub mod users;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::payload::{self, Payload};

pub use jobs::JobController;
pub use users::UserController;

/// Status plus typed body; axum renders it as JSON.
pub type Reply<T> = Result<(StatusCode, Json<T>), AppError>;

pub(crate) fn ok<T>(body: T) -> Reply<T> {
    Ok((StatusCode::OK, Json(body)))
}

pub(crate) fn created<T>(body: T) -> Reply<T> {
    Ok((StatusCode::CREATED, Json(body)))
}

/// Plain-text outcome rendered as `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reads an id field that presence validation already guaranteed is there.
pub(crate) fn require_id(data: &Payload, key: &str) -> Result<i32, AppError> {
    payload::id(data, key).ok_or_else(|| AppError::Validation(format!("{key} must be an integer")))
}

pub(crate) fn field(data: &Payload, key: &str) -> String {
    payload::text(data, key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_id_accepts_strings_and_numbers() {
        let data = json!({"a": "7", "b": 8, "c": "x"}).as_object().cloned().unwrap();
        assert_eq!(require_id(&data, "a").unwrap(), 7);
        assert_eq!(require_id(&data, "b").unwrap(), 8);
        let err = require_id(&data, "c").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "c must be an integer"));
    }

    #[test]
    fn test_message_serializes_as_object() {
        let v = serde_json::to_value(Message::new("Password updated")).unwrap();
        assert_eq!(v, json!({"message": "Password updated"}));
    }
}
