use std::sync::Arc;
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use wicket_crypto::SESSION_TTL;
use wicket_types::api::{LoginRequest, MessageResponse, SignupRequest, SignupResponse};

use crate::error::ApiError;
use crate::middleware::SESSION_COOKIE;
use crate::service::AuthService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub auth: AuthService,
    /// Set the `Secure` attribute on the session cookie. Only turned off for
    /// plain-http local development.
    pub cookie_secure: bool,
}

pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.signup(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".into(),
            success: true,
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth.login(req).await?;
    let cookie = session_cookie(session.token, state.cookie_secure);

    Ok((
        jar.add(cookie),
        Json(MessageResponse {
            message: "Login successful".into(),
            success: true,
        }),
    ))
}

/// Expire the session cookie on the client. Tokens are stateless, so there
/// is nothing to revoke server-side.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let mut cookie = session_cookie(String::new(), state.cookie_secure);
    cookie.make_removal();

    (
        jar.add(cookie),
        Json(MessageResponse {
            message: "Logout successful".into(),
            success: true,
        }),
    )
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie_max_age(SESSION_TTL))
        .build()
}

fn cookie_max_age(ttl: Duration) -> time::Duration {
    time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc".into(), true);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(1)));
    }

    #[test]
    fn insecure_cookie_for_local_dev() {
        let cookie = session_cookie("abc".into(), false);
        assert_eq!(cookie.secure(), Some(false));
        assert!(!cookie.to_string().contains("Secure"));
    }

    #[test]
    fn max_age_saturates_instead_of_wrapping() {
        assert_eq!(cookie_max_age(Duration::from_secs(60)), time::Duration::seconds(60));
        assert_eq!(cookie_max_age(Duration::MAX), time::Duration::MAX);
        assert!(cookie_max_age(Duration::from_secs(u64::MAX)).is_positive());
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let mut cookie = session_cookie(String::new(), true);
        cookie.make_removal();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
