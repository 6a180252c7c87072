use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MovieApiError {
    #[error("No internet connection")]
    Offline,
    #[error("Error Occurred: request timed out")]
    Timeout,
    #[error("API error: {}", describe_status(.http_status, .message))]
    Status {
        code: ErrorCode,
        http_status: u16,
        message: String,
    },
    #[error("Error Occurred: failed to decode response: {0}")]
    Decode(String),
    #[error("Error Occurred: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

fn describe_status(http_status: &u16, message: &str) -> String {
    if message.is_empty() {
        http_status.to_string()
    } else {
        format!("{http_status} - {message}")
    }
}

impl MovieApiError {
    pub fn is_offline(&self) -> bool {
        matches!(self, MovieApiError::Offline)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            MovieApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ApiError> for MovieApiError {
    fn from(value: ApiError) -> Self {
        MovieApiError::Status {
            code: value.code,
            http_status: value.http_status,
            message: value.message,
        }
    }
}

impl From<reqwest::Error> for MovieApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            MovieApiError::Offline
        } else if err.is_timeout() {
            MovieApiError::Timeout
        } else if err.is_decode() {
            MovieApiError::Decode(err.to_string())
        } else {
            MovieApiError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for MovieApiError {
    fn from(err: serde_json::Error) -> Self {
        MovieApiError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for MovieApiError {
    fn from(err: url::ParseError) -> Self {
        MovieApiError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_includes_api_text_when_present() {
        let err = MovieApiError::from(ApiError::new(401, "Invalid API key"));
        assert_eq!(err.to_string(), "API error: 401 - Invalid API key");
        assert_eq!(err.code(), Some(ErrorCode::Unauthorized));

        let bare = MovieApiError::from(ApiError::new(500, ""));
        assert_eq!(bare.to_string(), "API error: 500");
    }

    #[test]
    fn offline_reads_as_connectivity_problem() {
        assert_eq!(MovieApiError::Offline.to_string(), "No internet connection");
        assert!(MovieApiError::Offline.is_offline());
    }
}
