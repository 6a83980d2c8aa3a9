//! Route guard for protected endpoints.
//!
//! Accepts `Authorization: Bearer <jwt>` or the access cookie. Verified claims are
//! stored in request extensions. After the handler runs, a token close to expiry is
//! replaced by appending a fresh access cookie to the response.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use tracing::{debug, warn};

use crate::auth::token::{access_cookie, TokenService, ACCESS_COOKIE};
use crate::errors::AppError;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers()).ok_or(AppError::Unauthorized)?;
    let claims = state.tokens.verify(&token)?;
    req.extensions_mut().insert(claims.clone());

    let mut response = next.run(req).await;

    // Handlers that already manage the cookie (login/logout) take precedence.
    if response.headers().contains_key(header::SET_COOKIE)
        || !TokenService::needs_refresh(&claims, Utc::now())
    {
        return Ok(response);
    }

    match state.tokens.reissue(&claims) {
        Ok(fresh) => {
            let cookie = access_cookie(fresh, state.config.cookie_secure);
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                    debug!("Refreshed access token for user {}", claims.user_id);
                }
                Err(e) => warn!("Refreshed cookie is not a valid header: {e}"),
            }
        }
        Err(e) => warn!("Token refresh failed: {e}"),
    }

    Ok(response)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token_cookie=xyz"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token_cookie=xyz"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers), None);
    }
}
