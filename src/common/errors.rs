//! Error taxonomy for session operations and reference persistence.

use thiserror::Error;

use crate::transport::TransferError;

/// Failures from the reference store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read reference store: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to persist reference store: {0}")]
    Write(#[source] std::io::Error),
    #[error("reference store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures surfaced by session operations.
///
/// Every variant is terminal for the single operation that produced it and
/// non-fatal to the session: the session stays usable afterwards.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("a transfer is already in flight")]
    TransferBusy,
    #[error("nothing published to remove")]
    NothingPublished,
    #[error("upload failed: {0}")]
    TransferFailure(#[source] TransferError),
    #[error("delete failed: {0}")]
    DeletionFailure(#[source] TransferError),
    #[error("reference store failure: {0}")]
    Store(#[from] StoreError),
}
