use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::error::AppError;
use crate::server::AppState;

use super::health::health;
use super::send::send;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health))
        // Form submissions
        .route("/send", post(send))
}

/// JSON 404 for unknown paths
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// JSON 405 for known paths called with the wrong method
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
