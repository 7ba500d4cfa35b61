use catalog_protocol::ErrorBody;
use catalog_store::StoreError;

/// Failure of a single HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::Store(_) => 500,
        }
    }

    /// Body sent to the client. Store failures are not echoed back.
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Store(_) => ErrorBody::new("Internal server error"),
            other => ErrorBody::new(other.to_string()),
        }
    }
}
