//! Auth route handlers.
//!
//! Registration, login, password changes and password resets. All bodies
//! are JSON; malformed bodies are rejected as `validation_error`.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fitroom_core::UserName;

use super::{Success, success};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{Preference, Profile};
use crate::services::auth::reset::generate_secret;
use crate::services::auth::{AccountService, AuthError, Registration, ResetTokenIssuer};
use crate::state::AppState;

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

// =============================================================================
// Register / Login
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub preference: Preference,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: Profile,
}

/// Register a new user and their empty cart.
///
/// POST /api/v1/auth/register
///
/// # Errors
///
/// `conflict` if the name is taken, `validation_error` for bad input.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Success<RegisterResponse>>)> {
    let accounts = AccountService::new(state.stores(), state.hasher());

    let user = accounts
        .register(Registration {
            name: req.name,
            password: req.password,
            age: req.age,
            gender: req.gender,
            country: req.country,
            preference: req.preference,
        })
        .await?;

    tracing::info!(user.id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        success(RegisterResponse {
            message: "User registered",
            user: Profile::from(user),
        }),
    ))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// Authenticate and issue a bearer credential.
///
/// POST /api/v1/auth/login
///
/// # Errors
///
/// `invalid_credentials` if the name or password is wrong.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<Success<LoginResponse>>> {
    let accounts = AccountService::new(state.stores(), state.hasher());

    let user = accounts.login(&req.name, &req.password).await?;

    let issued = state
        .tokens()
        .issue(user.id, user.role)
        .map_err(AuthError::from)?;

    tracing::info!(user.id = %user.id, "user logged in");

    Ok(success(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

/// The authenticated user's profile.
///
/// GET /api/v1/auth/me
///
/// # Errors
///
/// `unauthorized` without a valid bearer credential.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Success<Profile>>> {
    let accounts = AccountService::new(state.stores(), state.hasher());
    Ok(success(accounts.profile(auth.id).await?))
}

// =============================================================================
// Passwords
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

/// Change the authenticated user's password.
///
/// POST /api/v1/auth/change-password
///
/// # Errors
///
/// `password_reused` if the password matches the current or one of the
/// last six.
#[instrument(skip_all, fields(user.id = %auth.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Success<Message>>> {
    AccountService::new(state.stores(), state.hasher())
        .change_password(&auth.name, &req.new_password)
        .await?;

    Ok(success(Message {
        message: "Password changed",
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
    pub reset_token: String,
}

/// Issue a password reset token.
///
/// POST /api/v1/auth/forgot-password
///
/// The token is returned in the body instead of being mailed. The response
/// is identical whether or not the account exists; unknown names receive a
/// random token that was never stored.
///
/// # Errors
///
/// `internal` if storage fails.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<Success<ForgotPasswordResponse>>> {
    let issued = match UserName::parse(&req.name) {
        Ok(name) => {
            ResetTokenIssuer::new(state.stores(), state.hasher())
                .request_reset(&name)
                .await?
        }
        Err(_) => None,
    };

    let reset_token = issued.unwrap_or_else(|| {
        tracing::debug!("reset requested for unknown account");
        generate_secret()
    });

    Ok(success(ForgotPasswordResponse {
        message: "If the account exists, a reset token has been issued",
        reset_token,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Consume a reset token and set a new password.
///
/// POST /api/v1/auth/reset-password
///
/// # Errors
///
/// `invalid_or_expired_token` if the token is unknown, used or expired;
/// `password_reused` if the password was used recently.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<Success<Message>>> {
    if req.token.trim().is_empty() {
        return Err(AppError::Validation("token is required".to_string()));
    }

    ResetTokenIssuer::new(state.stores(), state.hasher())
        .consume_reset(req.token.trim(), &req.new_password)
        .await?;

    Ok(success(Message {
        message: "Password has been reset",
    }))
}
