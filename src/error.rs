//! ==============================================================================
//! error.rs - dashboard error type
//! ==============================================================================
//!
//! every fallible operation in the library returns `DashboardError`.
//! the refresh cycle decides per call site whether an error is only logged
//! (reads), surfaced through `Renderer::alert` (control writes), or treated
//! as a malformed response (logged at error level, nothing rendered).
//!
//! ==============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// network failure or a body that could not be decoded as json
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// the controller answered with a non-2xx status
    #[error("HTTP error! status: {status} ({url})")]
    HttpStatus { status: u16, url: String },

    /// the controller answered but the body status was not "success"
    #[error("controller rejected request: {message}")]
    Rejected { message: String },

    /// the body decoded but did not have the expected shape
    #[error("unexpected data format: {0}")]
    UnexpectedShape(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// build a `Rejected` from an optional server message
    pub fn rejected(status: Option<&str>, message: Option<&str>) -> Self {
        let message = match (status, message) {
            (_, Some(m)) if !m.is_empty() => m.to_string(),
            (Some(s), _) => format!("status \"{}\"", s),
            (None, _) => "no status in response".to_string(),
        };
        DashboardError::Rejected { message }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_prefers_server_message() {
        let e = DashboardError::rejected(Some("error"), Some("Missing params"));
        assert_eq!(e.to_string(), "controller rejected request: Missing params");
    }

    #[test]
    fn rejected_falls_back_to_status() {
        let e = DashboardError::rejected(Some("warning"), None);
        assert_eq!(e.to_string(), "controller rejected request: status \"warning\"");

        let e = DashboardError::rejected(None, Some(""));
        assert_eq!(e.to_string(), "controller rejected request: no status in response");
    }

    #[test]
    fn http_status_names_the_code() {
        let e = DashboardError::HttpStatus { status: 500, url: "http://x/y".into() };
        assert!(e.to_string().contains("500"));
    }
}
