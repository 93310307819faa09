//! HTTP transport: multipart upload with a progress-counting body, DELETE
//! to retire the artifact.

use bytes::Bytes;
use futures::stream;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{PublishReceipt, PublishTransport, TransferError};
use crate::common::progress::ProgressTracker;
use crate::session::FileBlob;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Production transport over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    chunk_size: usize,
}

impl HttpTransport {
    /// Transport with default timeout and chunking.
    pub fn new() -> Result<Self, TransferError> {
        Self::with_settings(DEFAULT_TIMEOUT, DEFAULT_CHUNK_SIZE)
    }

    /// Transport with an explicit request timeout and upload chunk size.
    /// Smaller chunks give finer progress granularity.
    pub fn with_settings(timeout: Duration, chunk_size: usize) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            chunk_size: chunk_size.max(1),
        })
    }
}

/// Split a blob into chunk-size slices. Slicing `Bytes` is reference
/// counted, so this copies nothing.
fn chunk_blob(bytes: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(chunk_size).max(1));
    let mut start = 0;
    while start < bytes.len() {
        let end = (start + chunk_size).min(bytes.len());
        chunks.push(bytes.slice(start..end));
        start = end;
    }
    chunks
}

/// Content type derived from the file name. The backend stores PDFs, but
/// anything else goes up as an opaque octet stream.
fn mime_for(name: &str) -> &'static str {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

#[async_trait::async_trait]
impl PublishTransport for HttpTransport {
    async fn upload(
        &self,
        upload_url: &str,
        blob: &FileBlob,
        tracker: Arc<ProgressTracker>,
    ) -> Result<PublishReceipt, TransferError> {
        let total = blob.bytes.len() as u64;
        debug!(url = upload_url, file = %blob.name, size = total, "starting upload");

        // Each chunk ticks the tracker as the client pulls it off the stream,
        // which is as close to "handed to the wire" as reqwest exposes.
        let chunks = chunk_blob(&blob.bytes, self.chunk_size);
        let counter = tracker.clone();
        let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
            counter.record(chunk.len() as u64);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body_stream), total)
            .file_name(blob.name.clone())
            .mime_str(mime_for(&blob.name))?;
        let form = Form::new().part("file", part);

        let response = self.client.post(upload_url).multipart(form).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TransferError::Status(status));
        }

        let receipt: PublishReceipt = response
            .json()
            .await
            .map_err(|err| TransferError::MalformedResponse(err.to_string()))?;
        if receipt.url.is_empty() {
            return Err(TransferError::MalformedResponse(
                "response url is empty".to_string(),
            ));
        }

        tracker.complete();
        Ok(receipt)
    }

    async fn delete(&self, delete_url: &str) -> Result<(), TransferError> {
        debug!(url = delete_url, "deleting published artifact");

        let response = self.client.delete(delete_url).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TransferError::Status(status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_covers_all_bytes_in_order() {
        let bytes = Bytes::from(vec![7u8; 10]);
        let chunks = chunk_blob(&bytes, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 4);
        assert_eq!(chunks[1].len(), 4);
        assert_eq!(chunks[2].len(), 2);
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn chunking_empty_blob_yields_no_chunks() {
        let chunks = chunk_blob(&Bytes::new(), 4);
        assert!(chunks.is_empty());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let bytes = Bytes::from(vec![0u8; 8]);
        let chunks = chunk_blob(&bytes, 4);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 4));
    }

    #[test]
    fn pdf_names_get_pdf_mime() {
        assert_eq!(mime_for("sched.pdf"), "application/pdf");
        assert_eq!(mime_for("SCHED.PDF"), "application/pdf");
        assert_eq!(mime_for("notes.txt"), "application/octet-stream");
        assert_eq!(mime_for("pdf"), "application/octet-stream");
    }
}
