//! Style preference route handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use super::{Success, success};
use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::Preference;
use crate::services::auth::AccountService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    pub preference: Preference,
}

/// GET /api/v1/user/preferences
///
/// # Errors
///
/// `unauthorized` without a valid bearer credential.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Success<PreferenceResponse>>> {
    let preference = AccountService::new(state.stores(), state.hasher())
        .preferences(auth.id)
        .await?;
    Ok(success(PreferenceResponse { preference }))
}

/// Replace the stored preference block.
///
/// PUT /api/v1/user/preferences
///
/// # Errors
///
/// `unauthorized` without a valid bearer credential.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(preference): ApiJson<Preference>,
) -> Result<Json<Success<PreferenceResponse>>> {
    let preference = AccountService::new(state.stores(), state.hasher())
        .update_preferences(auth.id, preference)
        .await?;
    tracing::info!(user.id = %auth.id, "preferences updated");
    Ok(success(PreferenceResponse { preference }))
}
