//! Form submission endpoint.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::delivery::DeliveryReceipt;
use crate::error::{AppError, Result};
use crate::relay::{compose, Submission};
use crate::server::AppState;

/// Success envelope: `{ok: true, ...receipt, timestamp}`
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub receipt: DeliveryReceipt,
    pub timestamp: DateTime<Utc>,
}

/// Validate a submission and relay it through the configured delivery strategy.
#[tracing::instrument(name = "http.send", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<SendResponse>> {
    if !is_json(&headers) {
        return Err(AppError::ClientInput(
            "Content-Type must be application/json".to_string(),
        ));
    }

    let body = body.map_err(|e| AppError::ClientInput(e.body_text()))?;
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::ClientInput(format!("Request body is not valid JSON: {}", e)))?;
    let serde_json::Value::Object(fields) = value else {
        return Err(AppError::ClientInput(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let submission =
        Submission::from_json(&fields).map_err(|e| AppError::ClientInput(e.to_string()))?;
    let message = compose(&submission);

    let receipt = state.delivery.deliver(&submission, &message).await?;
    tracing::info!(mode = state.delivery.mode().as_str(), "Submission relayed");

    Ok(Json(SendResponse {
        ok: true,
        receipt,
        timestamp: Utc::now(),
    }))
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(content_type: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json(&headers(Some("application/json"))));
        assert!(is_json(&headers(Some("application/json; charset=utf-8"))));
        assert!(is_json(&headers(Some("Application/JSON"))));
        assert!(is_json(&headers(Some("application/vnd.api+json"))));
    }

    #[test]
    fn test_non_json_content_types() {
        assert!(!is_json(&headers(None)));
        assert!(!is_json(&headers(Some("text/plain"))));
        assert!(!is_json(&headers(Some("application/x-www-form-urlencoded"))));
        assert!(!is_json(&headers(Some("text/json+xml"))));
    }
}
