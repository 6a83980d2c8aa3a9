use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_COOKIE: &str = "access_token_cookie";

/// Tokens expiring within this window are re-issued on the way out.
pub const REFRESH_WINDOW_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the authenticated user.
    pub sub: String,
    pub user_id: i32,
    #[serde(rename = "type")]
    pub account_type: i16,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i32, email: &str, account_type: i16) -> Result<String, AppError> {
        self.issue_at(user_id, email, account_type, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: i32,
        email: &str,
        account_type: i16,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: email.to_string(),
            user_id,
            account_type,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))
    }

    /// Issues a fresh token for the same identity.
    pub fn reissue(&self, claims: &Claims) -> Result<String, AppError> {
        self.issue(claims.user_id, &claims.sub, claims.account_type)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {e}");
                AppError::Unauthorized
            })
    }

    pub fn needs_refresh(claims: &Claims, now: DateTime<Utc>) -> bool {
        (now + Duration::minutes(REFRESH_WINDOW_MINUTES)).timestamp() > claims.exp
    }
}

pub fn access_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Expired, empty access cookie. Sent on logout whether or not the request carried one.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((ACCESS_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}
