//! Selected-file representation independent of any picker surface.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::fmt;
use std::path::Path;

/// Opaque selected file: display name plus owned bytes.
///
/// Clones share the underlying buffer, so handing a copy to an in-flight
/// upload is cheap.
#[derive(Clone)]
pub struct FileBlob {
    pub name: String,
    pub bytes: Bytes,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Load a blob from disk, using the file name component for display.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();

        let bytes = tokio::fs::read(path)
            .await
            .context(format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            name,
            bytes: Bytes::from(bytes),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn from_path_reads_name_and_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sched.pdf");
        tokio::fs::write(&path, b"%PDF-1.4 test").await.unwrap();

        let blob = FileBlob::from_path(&path).await.unwrap();
        assert_eq!(blob.name, "sched.pdf");
        assert_eq!(blob.len(), 13);
        assert!(!blob.is_empty());
    }

    #[tokio::test]
    async fn from_path_fails_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = FileBlob::from_path(&dir.path().join("absent.pdf")).await;
        assert!(result.is_err());
    }

    #[test]
    fn debug_omits_contents() {
        let blob = FileBlob::new("sched.pdf", vec![1u8; 4096]);
        let rendered = format!("{blob:?}");
        assert!(rendered.contains("sched.pdf"));
        assert!(rendered.contains("4096"));
    }
}
