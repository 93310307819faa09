use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use timedrop::common::progress::ProgressTracker;
use timedrop::session::FileBlob;
use timedrop::transport::{PublishReceipt, PublishTransport, TransferError};

/// Scripted transport that mimics the backend without any network.
///
/// Records calls and the endpoints they hit so tests can assert routing;
/// drives the tracker in steps so progress assertions see intermediate
/// values.
pub struct StubTransport {
    url: String,
    fail_upload: bool,
    fail_delete: bool,
    delay: Option<Duration>,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
    last_upload_url: Mutex<Option<String>>,
    last_delete_url: Mutex<Option<String>>,
    last_file_name: Mutex<Option<String>>,
}

impl StubTransport {
    fn base(url: &str) -> Self {
        Self {
            url: url.to_string(),
            fail_upload: false,
            fail_delete: false,
            delay: None,
            uploads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            last_upload_url: Mutex::new(None),
            last_delete_url: Mutex::new(None),
            last_file_name: Mutex::new(None),
        }
    }

    /// Both operations succeed; uploads publish at `url`.
    pub fn succeeding(url: &str) -> Arc<Self> {
        Arc::new(Self::base(url))
    }

    /// Both operations fail with an internal server error.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_upload: true,
            fail_delete: true,
            ..Self::base("")
        })
    }

    /// Uploads succeed at `url`, deletes fail.
    pub fn failing_delete(url: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_delete: true,
            ..Self::base(url)
        })
    }

    /// Both operations succeed after sleeping `delay`, for busy-guard tests.
    pub fn slow(url: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::base(url)
        })
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn last_upload_url(&self) -> Option<String> {
        self.last_upload_url.lock().unwrap().clone()
    }

    pub fn last_delete_url(&self) -> Option<String> {
        self.last_delete_url.lock().unwrap().clone()
    }

    pub fn last_file_name(&self) -> Option<String> {
        self.last_file_name.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishTransport for StubTransport {
    async fn upload(
        &self,
        upload_url: &str,
        blob: &FileBlob,
        tracker: Arc<ProgressTracker>,
    ) -> Result<PublishReceipt, TransferError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        *self.last_upload_url.lock().unwrap() = Some(upload_url.to_string());
        *self.last_file_name.lock().unwrap() = Some(blob.name.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_upload {
            return Err(TransferError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }

        // Hand the bytes over in quarters so observers see progress move
        let total = blob.len() as u64;
        let step = total / 4;
        for _ in 0..3 {
            tracker.record(step);
            tokio::task::yield_now().await;
        }
        tracker.record(total - 3 * step);
        tracker.complete();

        Ok(PublishReceipt {
            url: self.url.clone(),
        })
    }

    async fn delete(&self, delete_url: &str) -> Result<(), TransferError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        *self.last_delete_url.lock().unwrap() = Some(delete_url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_delete {
            return Err(TransferError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }

        Ok(())
    }
}
