use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::AppState;
use crate::error::ApiError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Verify the session cookie and stash its claims in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    let claims = state.auth.verify_session(token.as_deref())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
