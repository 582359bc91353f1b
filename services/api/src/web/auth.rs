//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: register, login, logout, and the password-reset pair.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use reading_tracker_core::{
    ports::PortError, Credentials, PasswordResetToken, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::web::extract::ApiForm;
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

const INVALID_LOGIN: &str = "Invalid username or password.";
const RESET_ISSUED: &str =
    "If an account with that username exists, a password reset link has been issued.";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ForgotForm {
    #[serde(default)]
    pub username: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetForm {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hashed_password: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed_password)
        .map_err(|e| ApiError::Internal(format!("Failed to parse password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn session_cookie(config: &Config, auth_session_id: &str) -> String {
    let secure = if config.cookie_secure { " Secure;" } else { "" };
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        secure,
        Duration::days(config.session_ttl_days).num_seconds()
    )
}

fn cleared_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new user account
///
/// Does not log the new user in.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Username or password missing"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<CredentialsForm>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = Credentials::new(&form.username, &form.password)?;
    let password_hash = hash_password(&creds.password)?;

    let user = state
        .db
        .create_user(&creds.username, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => PortError::Conflict("User already exists.".to_string()),
            other => other,
        })?;
    info!(user_id = %user.user_id, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.user_id,
            username: user.username,
        }),
    ))
}

/// POST /login - Login with an existing account
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<CredentialsForm>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = Credentials::new(&form.username, &form.password)?;

    // 1. Get user by username
    let user_creds = match state.db.get_user_by_username(&creds.username).await {
        Ok(user_creds) => user_creds,
        Err(PortError::NotFound(_)) => {
            warn!("Login attempt for unknown user");
            return Err(ApiError::Unauthorized(INVALID_LOGIN.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    if !verify_password(&creds.password, &user_creds.hashed_password)? {
        warn!(user_id = %user_creds.user_id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized(INVALID_LOGIN.to_string()));
    }

    // 3. Create auth session in database
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&auth_session_id, user_creds.user_id, expires_at)
        .await?;
    info!(user_id = %user_creds.user_id, "User logged in");

    // 4. Return response with cookie
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&state.config, &auth_session_id))],
        Json(AuthResponse {
            user_id: user_creds.user_id,
            username: user_creds.username,
        }),
    ))
}

/// GET /logout - Invalidate the session and return to the start page
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirected to /")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(auth_session_id) = session_id_from_headers(&headers) {
        if let Err(e) = state.db.delete_auth_session(auth_session_id).await {
            error!("Failed to delete auth session: {:?}", e);
        }
    }

    ([(header::SET_COOKIE, cleared_cookie())], Redirect::to("/"))
}

/// POST /forgot - Issue a password reset token
///
/// The reply is the same whether or not the username exists. Stored password
/// hashes are never returned.
#[utoipa::path(
    post,
    path = "/forgot",
    request_body(content = ForgotForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Reset issued if the user exists", body = MessageResponse),
        (status = 400, description = "Username missing")
    )
)]
pub async fn forgot_handler(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<ForgotForm>,
) -> Result<impl IntoResponse, ApiError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(ValidationError::EmptyCredentials.into());
    }

    let user_creds = match state.db.get_user_by_username(username).await {
        Ok(user_creds) => user_creds,
        Err(PortError::NotFound(_)) => return Ok(MessageResponse::new(RESET_ISSUED)),
        Err(e) => return Err(e.into()),
    };

    let token = PasswordResetToken {
        token: Uuid::new_v4().to_string(),
        user_id: user_creds.user_id,
        expires_at: Utc::now() + Duration::minutes(state.config.reset_token_ttl_minutes),
    };
    state.db.create_reset_token(&token).await?;
    state
        .notifier
        .send_reset_token(&user_creds.username, &token)
        .await?;
    info!(user_id = %user_creds.user_id, "Issued password reset token");

    Ok(MessageResponse::new(RESET_ISSUED))
}

/// POST /reset - Set a new password using a reset token
///
/// Every existing login session of the user is revoked.
#[utoipa::path(
    post,
    path = "/reset",
    request_body(content = ResetForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Password missing"),
        (status = 401, description = "Token unknown, used, or expired")
    )
)]
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<ResetForm>,
) -> Result<impl IntoResponse, ApiError> {
    if form.password.is_empty() {
        return Err(ValidationError::EmptyPassword.into());
    }

    let user_id = match state.db.consume_reset_token(form.token.trim()).await {
        Ok(user_id) => user_id,
        Err(PortError::Unauthorized) => {
            return Err(ApiError::Unauthorized(
                "This reset link is invalid or has expired.".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let password_hash = hash_password(&form.password)?;
    state.db.update_password(user_id, &password_hash).await?;
    state.db.delete_auth_sessions_for_user(user_id).await?;
    info!(%user_id, "Password reset completed");

    Ok(MessageResponse::new("Your password has been changed. You can log in now."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_differ_per_salt() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first).unwrap());
        assert!(!verify_password("hunter3", &first).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("pw", "not-a-phc-string"),
            Err(ApiError::Internal(_))
        ));
    }
}
