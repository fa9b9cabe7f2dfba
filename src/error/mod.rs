use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::provisioning::ProvisionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Malformed request; never reaches the platform
    #[error("{0}")]
    ClientInput(String),

    /// The messaging platform answered with a non-success status
    #[error("{api} API error: {details}")]
    PlatformRejection { api: &'static str, details: String },

    #[error("{0}")]
    Provisioning(#[from] ProvisionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Internal(String),
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Rejected { api, status, body } => AppError::PlatformRejection {
                api,
                details: format!("{}: {}", status, body),
            },
            DeliveryError::Provisioning(e) => AppError::Provisioning(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ClientInput(_) => StatusCode::BAD_REQUEST,
            AppError::PlatformRejection { .. } => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Config(_) | AppError::Provisioning(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Failure envelope shared by every endpoint
#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        // Always log the detailed error server-side
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), message = %message, "Request failed");
        } else {
            tracing::warn!(status = %status.as_u16(), message = %message, "Request rejected");
        }

        let body = ErrorResponse {
            ok: false,
            error: message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
