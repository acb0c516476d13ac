/// User settings endpoints
///
/// - `GET /v1/settings` - Caller's settings
/// - `PUT /v1/settings` - Replace the caller's settings (validated)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use dreampip_shared::auth::context::AuthContext;
use dreampip_shared::settings::UserSettings;

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserSettings>> {
    Ok(Json(state.settings.get(auth.user_id).await?))
}

/// Replace settings
///
/// ```text
/// PUT /v1/settings
///
/// { "locale": "fr", "currency": "EUR", "theme": "dark", "monthly_budget": 1200 }
/// ```
///
/// Invalid fields are a 422 and leave the stored settings untouched.
pub async fn replace_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(settings): Json<UserSettings>,
) -> ApiResult<Json<UserSettings>> {
    Ok(Json(state.settings.replace(auth.user_id, settings).await?))
}
