use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 405 | 406 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            502..=504 => ErrorCode::Unavailable,
            _ => ErrorCode::Internal,
        }
    }
}

/// Error body the movie API returns alongside non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatusBody {
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub http_status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_http_status(http_status),
            http_status,
            message: message.into(),
        }
    }

    /// Builds an error from a response status and its (possibly empty or
    /// non-JSON) body.
    pub fn from_response(http_status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiStatusBody>(body)
            .map(|status| status.status_message)
            .unwrap_or_default();
        Self::new(http_status, message)
    }
}
