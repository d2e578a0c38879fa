/// Attachment blob storage
///
/// Attachments keep only an opaque reference to their payload. The
/// [`BlobStore`] trait hides where payloads live:
///
/// - [`FsBlobStore`]: files under a media root
/// - [`MemoryBlobStore`]: an in-process map for tests
///
/// References look like `attachments/<random hex>/<file name>`, unique per
/// upload, so deleting one attachment never removes another's payload. The
/// file name is sanitized to a single path segment.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use taskboard_shared::blob::{BlobStore, FsBlobStore};
///
/// # async fn example() -> Result<(), taskboard_shared::blob::BlobError> {
/// let blobs = FsBlobStore::new("/var/lib/taskboard/media");
/// let reference = blobs.put("report.pdf", Bytes::from_static(b"%PDF-1.7")).await?;
/// let payload = blobs.get(&reference).await?;
/// assert_eq!(&payload[..], b"%PDF-1.7");
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;

use crate::slug::Slug;

const PREFIX: &str = "attachments";

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob reference: {0}")]
    InvalidReference(String),

    #[error("Blob I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a payload and returns its stable reference
    async fn put(&self, file_name: &str, payload: Bytes) -> Result<String, BlobError>;

    async fn get(&self, reference: &str) -> Result<Bytes, BlobError>;

    /// Deleting a missing blob is not an error
    async fn delete(&self, reference: &str) -> Result<(), BlobError>;
}

/// Reduces a client-supplied file name to one safe path segment
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.chars().take(255).collect()
    }
}

fn new_reference(file_name: &str) -> String {
    format!("{PREFIX}/{}/{}", Slug::generate(), sanitize_file_name(file_name))
}

/// Rejects references that could escape the media root
fn checked_relative(reference: &str) -> Result<&Path, BlobError> {
    let path = Path::new(reference);
    let safe = path.starts_with(PREFIX)
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if safe {
        Ok(path)
    } else {
        Err(BlobError::InvalidReference(reference.to_string()))
    }
}

/// Filesystem blob store rooted at a media directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, file_name: &str, payload: Bytes) -> Result<String, BlobError> {
        let reference = new_reference(file_name);
        let path = self.root.join(checked_relative(&reference)?);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &payload).await?;

        tracing::debug!(reference = %reference, bytes = payload.len(), "blob stored");
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> Result<Bytes, BlobError> {
        let path = self.root.join(checked_relative(reference)?);

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let path = self.root.join(checked_relative(reference)?);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        // Each upload owns its directory
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::remove_dir(parent).await;
        }
        Ok(())
    }
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, file_name: &str, payload: Bytes) -> Result<String, BlobError> {
        let reference = new_reference(file_name);
        self.blobs.write().await.insert(reference.clone(), payload);
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> Result<Bytes, BlobError> {
        self.blobs
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(reference.to_string()))
    }

    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        self.blobs.write().await.remove(reference);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(sanitize_file_name("my file (1).png"), "my_file__1_.png");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn test_reference_is_unique_per_upload() {
        let a = new_reference("a.txt");
        let b = new_reference("a.txt");

        assert_ne!(a, b);
        assert!(a.starts_with("attachments/"));
        assert!(a.ends_with("/a.txt"));
        assert!(checked_relative(&a).is_ok());
    }

    #[test]
    fn test_rejects_escaping_references() {
        assert!(checked_relative("attachments/abc/file.txt").is_ok());
        assert!(checked_relative("attachments/../secret").is_err());
        assert!(checked_relative("/etc/passwd").is_err());
        assert!(checked_relative("other/abc/file.txt").is_err());
    }

    #[tokio::test]
    async fn test_fs_store_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let reference = store
            .put("notes.txt", Bytes::from_static(b"remember the milk"))
            .await
            .unwrap();
        assert!(dir.path().join(&reference).exists());

        let payload = store.get(&reference).await.unwrap();
        assert_eq!(&payload[..], b"remember the milk");

        store.delete(&reference).await.unwrap();
        assert!(matches!(
            store.get(&reference).await,
            Err(BlobError::NotFound(_))
        ));

        // Second delete is a no-op
        store.delete(&reference).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryBlobStore::new();
        let reference = store.put("a.bin", Bytes::from_static(&[1, 2, 3])).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(&store.get(&reference).await.unwrap()[..], &[1, 2, 3]);

        store.delete(&reference).await.unwrap();
        assert!(store.is_empty().await);
    }
}
