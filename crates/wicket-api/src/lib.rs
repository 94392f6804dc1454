pub mod auth;
pub mod error;
pub mod middleware;
pub mod profile;
pub mod routes;
pub mod service;
pub mod validation;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
pub use service::AuthService;
