use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::auth::password::{hash_password, normalize_answer, verify_password};
use crate::controllers::{created, field, ok, Message, Reply};
use crate::dao::{NewUser, ProfileEdit, ProfileRow, UserRow};
use crate::errors::AppError;
use crate::payload::{self, Payload};
use crate::state::AppState;
use crate::storage::{profile_pic_url, upload_profile_image};

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub account_type: i16,
}

impl From<UserRow> for CreatedUser {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            account_type: row.account_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i32,
    #[serde(rename = "type")]
    pub account_type: i16,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SecurityQuestions {
    pub q_type1: String,
    pub q_type2: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub account_type: i16,
    pub about: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DeletedUser {
    pub user_id: i32,
    pub deleted: bool,
}

/// Uploaded profile picture as received from the form.
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub bytes: Bytes,
    pub content_type: String,
}

pub struct UserController<'a> {
    state: &'a AppState,
}

impl<'a> UserController<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Registers a user. The password and both security answers are stored hashed.
    pub async fn create_user(&self, data: &Payload) -> Reply<CreatedUser> {
        let account_type = payload::integer(data, "type")
            .and_then(|t| i16::try_from(t).ok())
            .ok_or_else(|| AppError::Validation(crate::validation::valid_type_message()))?;

        let user = NewUser {
            first_name: field(data, "first_name"),
            last_name: field(data, "last_name"),
            email: field(data, "email"),
            password_hash: hash_password(&field(data, "password")).await?,
            account_type,
            q_type1: field(data, "q_type1"),
            q_type2: field(data, "q_type2"),
            ans1_hash: hash_password(&normalize_answer(&field(data, "ans1"))).await?,
            ans2_hash: hash_password(&normalize_answer(&field(data, "ans2"))).await?,
        };

        let row = self.state.users.create_user(&user).await?;
        info!("Created user {} (type {})", row.user_id, row.account_type);
        created(CreatedUser::from(row))
    }

    /// Unknown, deleted and wrong-password logins all get the same 401.
    pub async fn login_user(&self, data: &Payload) -> Reply<LoginResponse> {
        let email = field(data, "email");
        let credentials = self
            .state
            .users
            .find_credentials(&email)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&field(data, "password"), &credentials.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.state.tokens.issue(
            credentials.user_id,
            &credentials.email,
            credentials.account_type,
        )?;
        info!("User {} logged in", credentials.user_id);
        ok(LoginResponse {
            user_id: credentials.user_id,
            account_type: credentials.account_type,
            access_token,
        })
    }

    pub async fn get_all_users(&self, account_type: i16) -> Reply<Vec<UserRow>> {
        ok(self.state.users.list_by_type(account_type).await?)
    }

    /// The stored image key only changes when a new picture uploaded successfully.
    pub async fn edit_user(
        &self,
        user_id: i32,
        data: &Payload,
        image: Option<ProfileImage>,
    ) -> Reply<ProfileRow> {
        let image_key = match image {
            Some(image) => {
                upload_profile_image(
                    self.state.storage.as_ref(),
                    &self.state.config.aws_upload_folder,
                    user_id,
                    image.bytes,
                    &image.content_type,
                )
                .await
            }
            None => None,
        };

        let edit = ProfileEdit {
            user_id,
            first_name: field(data, "first_name"),
            last_name: field(data, "last_name"),
            about: field(data, "about"),
            street: field(data, "street"),
            city: field(data, "city"),
            zipcode: field(data, "zipcode"),
            image_key,
        };

        let row = self
            .state
            .users
            .edit_user(&edit)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        info!("Updated profile of user {user_id}");
        ok(row)
    }

    pub async fn retrieve_questions(&self, email: &str) -> Reply<SecurityQuestions> {
        let row = self
            .state
            .users
            .find_security(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        ok(SecurityQuestions {
            q_type1: row.q_type1,
            q_type2: row.q_type2,
        })
    }

    /// Resets the password once both security answers match.
    pub async fn change_password(&self, data: &Payload) -> Reply<Message> {
        let email = field(data, "email");
        let security = self
            .state
            .users
            .find_security(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let (Some(ans1), Some(ans2)) = (payload::text(data, "ans1"), payload::text(data, "ans2")) else {
            return Err(AppError::InvalidCredentials);
        };
        let ans1_ok = verify_password(&normalize_answer(&ans1), &security.ans1_hash).await?;
        let ans2_ok = verify_password(&normalize_answer(&ans2), &security.ans2_hash).await?;
        if !(ans1_ok && ans2_ok) {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = hash_password(&field(data, "password")).await?;
        self.state
            .users
            .update_password(security.user_id, &password_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        info!("Password changed for user {}", security.user_id);
        ok(Message::new("Password updated"))
    }

    pub async fn get_user_info(&self, user_id: i32) -> Reply<UserInfo> {
        let row = self
            .state
            .users
            .user_info(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        let image_url = match row.image_key.as_deref() {
            Some(key) => {
                profile_pic_url(
                    self.state.storage.as_ref(),
                    &self.state.config.aws_upload_folder,
                    key,
                    Duration::from_secs(self.state.config.aws_url_expire_seconds),
                )
                .await
            }
            None => None,
        };

        ok(UserInfo {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            account_type: row.account_type,
            about: row.about,
            street: row.street,
            city: row.city,
            zipcode: row.zipcode,
            image_url,
            rating: row.rating,
        })
    }

    pub async fn delete_user(&self, user_id: i32) -> Reply<DeletedUser> {
        let user_id = self
            .state
            .users
            .soft_delete(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        info!("Soft-deleted user {user_id}");
        ok(DeletedUser {
            user_id,
            deleted: true,
        })
    }
}
