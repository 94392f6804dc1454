use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::profile;

/// All HTTP routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/users/signup", post(auth::signup))
        .route("/users/login", post(auth::login))
        .route("/users/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/users/profile", get(profile::get_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
