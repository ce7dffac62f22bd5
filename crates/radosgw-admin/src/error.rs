//! Error types for the admin API client
//!
//! Every failure an admin call can produce maps onto one `AdminError` variant.
//! Callers treat them uniformly as "query failed"; the variants exist for logs.

use thiserror::Error;

/// Result type alias using AdminError
pub type Result<T> = std::result::Result<T, AdminError>;

/// Unified error type for admin API operations
#[derive(Debug, Error)]
pub enum AdminError {
    // Construction errors
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Signing error: {0}")]
    Signing(String),

    // Transport errors (connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Gateway answered with a non-2xx status
    #[error("Admin API returned {status}{}: {body}", code_suffix(.code))]
    Status {
        status: u16,
        code: Option<String>,
        body: String,
    },

    // Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl AdminError {
    /// Build a status error from a raw response body.
    ///
    /// The gateway reports failures as `{"Code": "NoSuchUser", ...}`; the code
    /// is lifted out when the body parses, otherwise only the body is kept.
    pub fn from_status(status: u16, body: String) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(rename = "Code")]
            code: Option<String>,
        }

        let code = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.code);
        AdminError::Status { status, code, body }
    }

    /// The gateway error code, if the failure carried one
    pub fn code(&self) -> Option<&str> {
        match self {
            AdminError::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for AdminError {
    fn from(err: url::ParseError) -> Self {
        AdminError::InvalidEndpoint(err.to_string())
    }
}
