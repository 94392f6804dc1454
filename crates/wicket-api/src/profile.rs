use axum::{Extension, Json, extract::State};

use wicket_types::api::{Claims, ProfileResponse};

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /users/profile. Claims come from `require_auth`.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.auth.find_user(claims.id).await?;

    Ok(Json(ProfileResponse {
        success: true,
        user: user.into(),
    }))
}
