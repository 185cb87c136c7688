use reqwest::StatusCode;
use std::fmt;

/// Non-success HTTP response from the quiz API, kept whole for diagnostics.
#[derive(Debug, Clone)]
pub struct ApiStatusError {
    pub endpoint: &'static str,
    pub status: StatusCode,
    pub body: String,
}

impl ApiStatusError {
    pub fn is_retryable(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS || self.status.is_server_error()
    }
}

impl fmt::Display for ApiStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quiz API error (endpoint={}, status={}): {}",
            self.endpoint, self.status, self.body
        )
    }
}

impl std::error::Error for ApiStatusError {}
