use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use crate::auth::token::{access_cookie, removal_cookie};
use crate::auth::Claims;
use crate::controllers::users::ProfileImage;
use crate::controllers::{Message, Reply, UserController};
use crate::dao::UserRow;
use crate::errors::AppError;
use crate::models::AccountType;
use crate::payload::{self, Payload};
use crate::state::AppState;
use crate::validation;

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let data = payload::from_json_body(&body);
    validation::validate_login_data(data.as_ref()).map_err(AppError::Validation)?;
    let data = data.unwrap_or_default();

    let (status, Json(login)) = UserController::new(&state).login_user(&data).await?;
    let jar = jar.add(access_cookie(
        login.access_token.clone(),
        state.config.cookie_secure,
    ));
    Ok((status, jar, Json(login)))
}

/// POST /api/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Message>) {
    (jar.add(removal_cookie()), Json(Message::new("Logout successful!")))
}

/// POST /api/create_user
pub async fn create_user(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let data = payload::from_json_body(&body);
    validation::validate_user_info(data.as_ref()).map_err(AppError::Validation)?;
    UserController::new(&state)
        .create_user(&data.unwrap_or_default())
        .await
}

/// GET /api/users with a JSON body carrying `type`.
pub async fn list_users(State(state): State<AppState>, body: Bytes) -> Reply<Vec<UserRow>> {
    let data = payload::from_json_body(&body)
        .filter(|p| p.contains_key("type"))
        .ok_or_else(|| AppError::Validation(validation::required_param_message("type")))?;
    // Codes must be JSON integers here; "1" is not a type.
    let account_type = data
        .get("type")
        .and_then(Value::as_i64)
        .and_then(AccountType::from_code)
        .ok_or_else(|| AppError::Validation(validation::valid_type_message()))?;
    UserController::new(&state)
        .get_all_users(account_type.code())
        .await
}

/// PUT /api/edit_user/:id, multipart form with an optional `image` file part.
pub async fn edit_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = Payload::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid image upload: {e}")))?;
            if let Some(content_type) = content_type.filter(|_| !bytes.is_empty()) {
                image = Some(ProfileImage { bytes, content_type });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?;
            form.insert(name, Value::String(value));
        }
    }

    validation::validate_profile_data(&form).map_err(AppError::Validation)?;
    UserController::new(&state).edit_user(user_id, &form, image).await
}

/// GET /api/change_password?email=
pub async fn security_questions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let email = params
        .get("email")
        .ok_or_else(|| AppError::Validation("Email not specify".to_string()))?;
    if !validation::validate_email(email) {
        return Err(AppError::Validation("Email provided is not valid".to_string()));
    }
    UserController::new(&state).retrieve_questions(email).await
}

/// PUT /api/change_password
pub async fn change_password(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let data = payload::from_json_body(&body);
    validation::validate_password_info(data.as_ref()).map_err(AppError::Validation)?;
    UserController::new(&state)
        .change_password(&data.unwrap_or_default())
        .await
}

/// GET /api/is_valid_token
pub async fn is_valid_token(Extension(claims): Extension<Claims>) -> (StatusCode, Json<Message>) {
    debug!("Token check for user {}", claims.user_id);
    (StatusCode::OK, Json(Message::new("User is authenticated!")))
}

/// GET /api/user_info/:id
pub async fn user_info(State(state): State<AppState>, Path(user_id): Path<i32>) -> Result<impl IntoResponse, AppError> {
    UserController::new(&state).get_user_info(user_id).await
}

/// POST /api/delete_user/:id
pub async fn delete_user(State(state): State<AppState>, Path(user_id): Path<i32>) -> Result<impl IntoResponse, AppError> {
    UserController::new(&state).delete_user(user_id).await
}
