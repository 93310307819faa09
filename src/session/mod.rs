//! Publish/retire lifecycle for a single uploaded artifact.

mod blob;
pub use blob::FileBlob;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use uuid::Uuid;

use crate::common::config::EndpointProfile;
use crate::common::errors::SessionError;
use crate::common::progress::ProgressTracker;
use crate::store::ReferenceStore;
use crate::transport::PublishTransport;

/// Lifecycle phase of the session's artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Selected,
    Uploading,
    Published,
    Deleting,
}

/// Observable state triple: status, progress percent, current reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub progress: u8,
    pub reference: Option<String>,
}

struct SessionInner {
    selected: Option<FileBlob>,
    reference: Option<String>,
    status: SessionStatus,
    progress: u8,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            progress: self.progress,
            reference: self.reference.clone(),
        }
    }
}

/// Owns one artifact slot: selection, upload with progress, persisted
/// reference, deletion.
///
/// At most one `publish()` or `remove()` runs at a time; overlapping calls
/// fail fast with `SessionError::TransferBusy`. View layers observe state
/// through `snapshot()` polling or the `subscribe()` watch channel.
pub struct UploadSession {
    id: Uuid,
    profile: EndpointProfile,
    store: Arc<dyn ReferenceStore>,
    transport: Arc<dyn PublishTransport>,
    inner: Arc<RwLock<SessionInner>>,
    watch_tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl UploadSession {
    pub fn new(
        profile: EndpointProfile,
        store: Arc<dyn ReferenceStore>,
        transport: Arc<dyn PublishTransport>,
    ) -> Self {
        let id = Uuid::new_v4();
        let inner = SessionInner {
            selected: None,
            reference: None,
            status: SessionStatus::Idle,
            progress: 0,
        };
        let (watch_tx, _) = watch::channel(inner.snapshot());

        tracing::debug!(session = %id, key = %profile.storage_key, "created upload session");

        Self {
            id,
            profile,
            store,
            transport,
            inner: Arc::new(RwLock::new(inner)),
            watch_tx: Arc::new(watch_tx),
        }
    }

    pub fn profile(&self) -> &EndpointProfile {
        &self.profile
    }

    /// Current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.read_inner().snapshot()
    }

    /// Watch receiver over state changes, for event-driven view layers.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.read_inner().status
    }

    /// The currently published reference URL, if any.
    pub fn reference(&self) -> Option<String> {
        self.read_inner().reference.clone()
    }

    /// Rehydrate the published reference from the store. Call once at
    /// startup; no network traffic is issued and the reference is not
    /// checked for existence.
    pub fn restore(&self) -> Result<(), SessionError> {
        let stored = self.store.get(&self.profile.storage_key)?;

        if let Some(url) = stored {
            {
                let mut inner = self.write_inner();
                inner.reference = Some(url.clone());
                inner.status = SessionStatus::Published;
            }
            tracing::info!(session = %self.id, url = %url, "restored published reference");
            self.notify();
        }

        Ok(())
    }

    /// Replace the selection; progress resets to 0 and status to `Selected`.
    /// No other side effects. While a transfer is in flight the new blob is
    /// held but status and progress stay with the transfer until it settles.
    pub fn select_file(&self, blob: FileBlob) {
        {
            let mut inner = self.write_inner();
            tracing::debug!(session = %self.id, file = %blob.name, size = blob.len(), "file selected");
            inner.selected = Some(blob);
            if !matches!(
                inner.status,
                SessionStatus::Uploading | SessionStatus::Deleting
            ) {
                inner.progress = 0;
                inner.status = SessionStatus::Selected;
            }
        }
        self.notify();
    }

    /// Drop the selection; status returns to `Published` when a reference
    /// exists, `Idle` otherwise. No-op while a transfer is in flight.
    pub fn clear_selection(&self) {
        {
            let mut inner = self.write_inner();
            if matches!(
                inner.status,
                SessionStatus::Uploading | SessionStatus::Deleting
            ) {
                return;
            }
            inner.selected = None;
            inner.progress = 0;
            inner.status = if inner.reference.is_some() {
                SessionStatus::Published
            } else {
                SessionStatus::Idle
            };
        }
        self.notify();
    }

    /// Upload the selected file and persist the returned reference.
    ///
    /// On success the reference replaces any previously published one. On
    /// failure the session reverts to `Selected` and the reference and
    /// store are left untouched; there is no automatic retry.
    pub async fn publish(&self) -> Result<String, SessionError> {
        // Claim the busy slot and take a cheap copy of the blob
        let blob = {
            let mut inner = self.write_inner();
            if matches!(
                inner.status,
                SessionStatus::Uploading | SessionStatus::Deleting
            ) {
                return Err(SessionError::TransferBusy);
            }
            let Some(blob) = inner.selected.clone() else {
                return Err(SessionError::NoFileSelected);
            };
            inner.status = SessionStatus::Uploading;
            inner.progress = 0;
            blob
        };
        self.notify();

        let tracker = Arc::new(ProgressTracker::new(blob.len() as u64));
        let forwarder = spawn_progress_forwarder(
            tracker.subscribe(),
            self.inner.clone(),
            self.watch_tx.clone(),
        );

        let result = self
            .transport
            .upload(&self.profile.upload_url, &blob, tracker.clone())
            .await;

        // Dropping the last tracker handle ends the forwarder; waiting for
        // it keeps progress updates ordered before the final snapshot.
        drop(tracker);
        let _ = forwarder.await;

        match result {
            Ok(receipt) => {
                if let Err(err) = self.store.set(&self.profile.storage_key, &receipt.url) {
                    tracing::error!(session = %self.id, error = %err, "upload succeeded but reference could not be persisted");
                    {
                        let mut inner = self.write_inner();
                        inner.status = SessionStatus::Selected;
                    }
                    self.notify();
                    return Err(err.into());
                }

                {
                    let mut inner = self.write_inner();
                    inner.reference = Some(receipt.url.clone());
                    inner.status = SessionStatus::Published;
                    inner.progress = 100;
                }
                self.notify();
                tracing::info!(session = %self.id, url = %receipt.url, "publish complete");
                Ok(receipt.url)
            }
            Err(err) => {
                tracing::error!(session = %self.id, error = %err, "upload failed");
                {
                    let mut inner = self.write_inner();
                    inner.status = SessionStatus::Selected;
                }
                self.notify();
                Err(SessionError::TransferFailure(err))
            }
        }
    }

    /// Delete the published artifact and forget its reference.
    ///
    /// On failure the reference and store are left unchanged; the delete is
    /// not assumed to have succeeded.
    pub async fn remove(&self) -> Result<(), SessionError> {
        {
            let mut inner = self.write_inner();
            if matches!(
                inner.status,
                SessionStatus::Uploading | SessionStatus::Deleting
            ) {
                return Err(SessionError::TransferBusy);
            }
            if inner.reference.is_none() {
                return Err(SessionError::NothingPublished);
            }
            inner.status = SessionStatus::Deleting;
        }
        self.notify();

        match self.transport.delete(&self.profile.delete_url).await {
            Ok(()) => {
                if let Err(err) = self.store.remove(&self.profile.storage_key) {
                    tracing::error!(session = %self.id, error = %err, "artifact deleted but stored reference could not be removed");
                    {
                        let mut inner = self.write_inner();
                        inner.status = SessionStatus::Published;
                    }
                    self.notify();
                    return Err(err.into());
                }

                {
                    let mut inner = self.write_inner();
                    inner.reference = None;
                    inner.progress = 0;
                    inner.status = SessionStatus::Idle;
                }
                self.notify();
                tracing::info!(session = %self.id, "artifact deleted");
                Ok(())
            }
            Err(err) => {
                tracing::error!(session = %self.id, error = %err, "delete failed");
                {
                    let mut inner = self.write_inner();
                    inner.status = SessionStatus::Published;
                }
                self.notify();
                Err(SessionError::DeletionFailure(err))
            }
        }
    }

    fn notify(&self) {
        let _ = self.watch_tx.send(self.read_inner().snapshot());
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, SessionInner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Session lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, SessionInner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Session lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Forwards tracker percent changes into the session's snapshot channel.
/// Exits when the tracker's last handle is dropped.
fn spawn_progress_forwarder(
    mut rx: watch::Receiver<u8>,
    inner: Arc<RwLock<SessionInner>>,
    tx: Arc<watch::Sender<SessionSnapshot>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let percent = *rx.borrow_and_update();
            let snapshot = {
                let mut inner = match inner.write() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                // Progress is only meaningful mid-upload
                if inner.status != SessionStatus::Uploading {
                    continue;
                }
                inner.progress = percent;
                inner.snapshot()
            };
            let _ = tx.send(snapshot);
        }
    })
}
