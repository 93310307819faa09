//! Transfer seam between the session and the backend endpoints.

pub mod http;
pub use http::HttpTransport;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::common::progress::ProgressTracker;
use crate::session::FileBlob;

/// Parsed successful upload response: the resolvable location of the stored
/// artifact. Extra response fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishReceipt {
    pub url: String,
}

/// Transport-level failures. Terminal for the operation that hit them.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(StatusCode),
    #[error("malformed upload response: {0}")]
    MalformedResponse(String),
}

/// Moves bytes to and from a configured endpoint pair.
#[async_trait]
pub trait PublishTransport: Send + Sync {
    /// Upload the blob as multipart field `file`, ticking `tracker` as bytes
    /// are handed to the wire. `tracker.complete()` fires only once the
    /// server has acknowledged the upload.
    async fn upload(
        &self,
        upload_url: &str,
        blob: &FileBlob,
        tracker: Arc<ProgressTracker>,
    ) -> Result<PublishReceipt, TransferError>;

    /// Delete the published artifact. Any non-error status counts as
    /// success; the response body is ignored.
    async fn delete(&self, delete_url: &str) -> Result<(), TransferError>;
}
