//! HTTP client for the catalog API.
//!
//! [`DataContext`] keeps the last fetched page of items as shared state and
//! issues one cancellable request per call. Every call takes a
//! [`CancellationToken`]; a superseded or torn-down caller cancels it and
//! the result is dropped instead of being committed.

mod data_context;
mod error;

pub use data_context::DataContext;
pub use data_context::FetchHandle;
pub use data_context::FetchParams;
pub use error::ClientError;
pub use tokio_util::sync::CancellationToken;

/// Environment variable overriding the API base URL.
pub const ENV_BASE_URL: &str = "CATALOG_BASE_URL";
