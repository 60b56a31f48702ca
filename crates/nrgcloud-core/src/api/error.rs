use thiserror::Error;

/// Where API credentials are issued
pub const API_SETUP_URL: &str = "https://cloud.nrgsystems.com/data-manager/api-setup";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(
        "Valid credentials are required. Visit {} to access your API credentials",
        API_SETUP_URL
    )]
    CredentialMissing,

    #[error("Unable to get session token (status {status}): {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Authorization failed (status {status}): {message}")]
    AuthorizationFailed { status: u16, message: String },

    #[error("No valid session token")]
    NoToken,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn token_request_failed(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::TokenRequestFailed {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }
}
