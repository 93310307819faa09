pub mod common;
pub mod session;
pub mod store;
pub mod transport;

pub use common::config::{AppConfig, EndpointProfile, Slot};
pub use session::{FileBlob, SessionSnapshot, SessionStatus, UploadSession};
