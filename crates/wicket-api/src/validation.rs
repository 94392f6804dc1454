use validator::Validate;

use wicket_types::api::SignupRequest;

use crate::error::ApiError;

/// Signup input that has passed shape checks, with username and email normalized.
#[derive(Debug)]
pub struct ValidSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Normalize first so the length and format rules see what will be stored.
pub fn validate_signup(req: SignupRequest) -> Result<ValidSignup, ApiError> {
    let req = SignupRequest {
        username: req.username.trim().to_string(),
        email: normalize_email(&req.email),
        password: req.password,
    };

    req.validate()?;

    Ok(ValidSignup {
        username: req.username,
        email: req.email,
        password: req.password,
    })
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
