#![allow(dead_code)]

use std::sync::Arc;
use timedrop::common::config::EndpointProfile;
use timedrop::session::{FileBlob, UploadSession};
use timedrop::store::{MemoryStore, ReferenceStore};
use timedrop::transport::PublishTransport;

pub const PUBLISHED_URL: &str = "https://host/files/sched.pdf";

pub fn test_profile() -> EndpointProfile {
    EndpointProfile::timetable("http://localhost:5000")
}

pub fn exam_test_profile() -> EndpointProfile {
    EndpointProfile::exam_timetable("http://localhost:5000")
}

pub fn pdf_blob(name: &str, size: usize) -> FileBlob {
    FileBlob::new(name, vec![0x25u8; size])
}

pub fn session_with(
    store: Arc<dyn ReferenceStore>,
    transport: Arc<dyn PublishTransport>,
) -> UploadSession {
    UploadSession::new(test_profile(), store, transport)
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}
