//! Error taxonomy for the job workflow.

use std::time::Duration;

/// Generic message used when the backend fails without saying why.
pub const GENERIC_FAILURE: &str = "Processing failed";

/// Failures produced by workflow operations.
///
/// Every variant is terminal for the action that raised it; nothing retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// Rejected before any network call (missing file, wrong extension, no selection).
    #[error("{0}")]
    Validation(String),

    /// The backend answered with `success=false`.
    #[error("{0}")]
    Backend(String),

    /// Network failure, non-2xx without an envelope, or an unparsable body.
    #[error("{0}")]
    Transport(String),

    /// A download was requested while no job is active.
    #[error("No results available. Please process a file first.")]
    NoActiveJob,

    /// The call exceeded its configured time budget.
    #[error("{op} timed out after {}s", .after.as_secs())]
    Timeout { op: &'static str, after: Duration },

    /// The call was aborted by the user or superseded by a newer one.
    #[error("Cancelled")]
    Cancelled,
}

impl WorkflowError {
    /// Build a backend failure, falling back to the generic message.
    pub fn backend(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => Self::Backend(m),
            _ => Self::Backend(GENERIC_FAILURE.to_string()),
        }
    }
}

impl From<reqwest::Error> for WorkflowError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Transport(format!("malformed response: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_falls_back_to_generic() {
        assert_eq!(
            WorkflowError::backend(None),
            WorkflowError::Backend(GENERIC_FAILURE.into())
        );
        assert_eq!(
            WorkflowError::backend(Some("  ".into())),
            WorkflowError::Backend(GENERIC_FAILURE.into())
        );
        assert_eq!(
            WorkflowError::backend(Some("Sample file not found".into())).to_string(),
            "Sample file not found"
        );
    }

    #[test]
    fn test_timeout_message() {
        let e = WorkflowError::Timeout {
            op: "results",
            after: Duration::from_secs(30),
        };
        assert_eq!(e.to_string(), "results timed out after 30s");
    }
}
