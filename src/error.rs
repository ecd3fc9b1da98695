use std::fmt;

use axum::http::StatusCode;

/// Failure of a round trip to the NGO backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...).
    Network(String),
    /// The backend answered with a non-success status.
    Status { status: u16, detail: String },
    /// The response body did not have the expected shape.
    Decode(String),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Could not reach the server: {}", msg),
            ApiError::Status { detail, .. } => write!(f, "{}", detail),
            ApiError::Decode(msg) => write!(f, "Unexpected response from the server: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<ApiError> for (StatusCode, String) {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Status { status, detail } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail,
            ),
            other => (StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}

/// Extracts a human readable message from an error body.
///
/// The backend answers with `{"detail": ...}` (FastAPI) or `{"message": ...}`;
/// anything else is passed through as plain text.
pub fn detail_from_body(body: &str, status: u16) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["detail", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return s.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    if trimmed.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        trimmed.to_string()
    }
}

/// Client-side validation failure. Never reaches the network.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_prefers_fastapi_detail() {
        assert_eq!(
            detail_from_body(r#"{"detail":"Donor not found"}"#, 404),
            "Donor not found"
        );
    }

    #[test]
    fn detail_falls_back_to_message_then_text() {
        assert_eq!(
            detail_from_body(r#"{"message":"Activity exists"}"#, 409),
            "Activity exists"
        );
        assert_eq!(detail_from_body("Bad gateway", 502), "Bad gateway");
        assert_eq!(detail_from_body("  ", 500), "Request failed with status 500");
    }

    #[test]
    fn structured_detail_is_serialized() {
        let detail = detail_from_body(r#"{"detail":[{"loc":["body","amount"]}]}"#, 422);
        assert!(detail.contains("amount"));
    }
}
