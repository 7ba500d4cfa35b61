/// Errors from catalog API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The caller's token fired first. Never shown to users.
    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response. `detail` carries the server's `error` field if any.
    #[error("Failed to {action} ({status})")]
    Status {
        action: &'static str,
        status: u16,
        detail: Option<String>,
    },

    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
