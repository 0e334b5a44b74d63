//! Content loading: resolve a [`Document`] to bytes and sniff its container.
//!
//! Notes carry their own text. Files are fetched through an [`ObjectStore`],
//! the boundary to whatever storage backs the uploads. Storage failures are
//! not retried here; a store that wants retries implements them itself.

use crate::error::{StorageError, SummarizeError};
use crate::request::Document;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Signature at the start of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Container classification derived from the first bytes of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Starts with `%PDF`.
    Pdf,
    /// Anything else; treated as raw text.
    Opaque,
}

/// Classify bytes by their 4-byte signature.
pub fn classify(bytes: &[u8]) -> ContainerKind {
    if bytes.starts_with(PDF_MAGIC) {
        ContainerKind::Pdf
    } else {
        ContainerKind::Opaque
    }
}

/// Raw document bytes plus their classification.
#[derive(Debug, Clone)]
pub struct LoadedContent {
    pub bytes: Vec<u8>,
    pub container: ContainerKind,
}

/// Read-only access to stored uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object stored under `key`.
    async fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Load a document's bytes.
///
/// A note is returned as its UTF-8 text and always classified
/// [`ContainerKind::Opaque`]; a file is fetched from `store` and sniffed.
pub async fn load(
    document: &Document,
    store: Option<&dyn ObjectStore>,
) -> Result<LoadedContent, SummarizeError> {
    match document {
        Document::Note { text } => Ok(LoadedContent {
            bytes: text.as_bytes().to_vec(),
            container: ContainerKind::Opaque,
        }),
        Document::File { key } => {
            let store = store.ok_or_else(|| SummarizeError::ContentUnavailable {
                key: key.clone(),
                source: StorageError::Access("no object store configured".into()),
            })?;
            let bytes = store.get_object_bytes(key).await.map_err(|source| {
                SummarizeError::ContentUnavailable {
                    key: key.clone(),
                    source,
                }
            })?;
            let container = classify(&bytes);
            info!("Loaded '{}': {} bytes, {:?}", key, bytes.len(), container);
            Ok(LoadedContent { bytes, container })
        }
    }
}

// ── Local directory store ────────────────────────────────────────────────────

/// Serves objects from files under a root directory.
///
/// Keys are relative paths; absolute keys and `..` components are refused so
/// a key can never escape the root.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(key);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || key.is_empty() {
            return Err(StorageError::Access(format!("invalid key '{key}'")));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        debug!("Reading object from {}", path.display());
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Access(format!("{}: {}", path.display(), e)),
        })
    }
}

// ── HTTP store ───────────────────────────────────────────────────────────────

/// Fetches objects with `GET {base_url}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SummarizeError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(key);
        info!("Downloading object from: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::Access(format!("timed out fetching '{url}'"))
            } else {
                StorageError::Access(e.to_string())
            }
        })?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => return Err(StorageError::NotFound),
            s if !s.is_success() => return Err(StorageError::Access(format!("HTTP {s}"))),
            _ => {}
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Access(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_magic() {
        assert_eq!(classify(b"%PDF-1.7\n..."), ContainerKind::Pdf);
        assert_eq!(classify(b"%PD"), ContainerKind::Opaque);
        assert_eq!(classify(b"hello"), ContainerKind::Opaque);
        assert_eq!(classify(&[0x89, b'P', b'N', b'G']), ContainerKind::Opaque);
    }

    #[tokio::test]
    async fn note_is_opaque_text() {
        let doc = Document::Note {
            text: "%PDF looking note".into(),
        };
        let loaded = load(&doc, None).await.unwrap();
        assert_eq!(loaded.container, ContainerKind::Opaque);
        assert_eq!(loaded.bytes, b"%PDF looking note");
    }

    #[tokio::test]
    async fn file_without_store_is_unavailable() {
        let doc = Document::File { key: "a.pdf".into() };
        let err = load(&doc, None).await.unwrap_err();
        assert!(matches!(err, SummarizeError::ContentUnavailable { .. }));
    }

    #[tokio::test]
    async fn fs_store_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.pdf"), b"%PDF-1.4 body").unwrap();
        let store = FsObjectStore::new(dir.path());

        let doc = Document::File {
            key: "doc.pdf".into(),
        };
        let loaded = load(&doc, Some(&store as &dyn ObjectStore)).await.unwrap();
        assert_eq!(loaded.container, ContainerKind::Pdf);

        let missing = store.get_object_bytes("nope.pdf").await.unwrap_err();
        assert!(matches!(missing, StorageError::NotFound));
    }

    #[tokio::test]
    async fn fs_store_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        for key in ["../etc/passwd", "/etc/passwd", ""] {
            let err = store.get_object_bytes(key).await.unwrap_err();
            assert!(matches!(err, StorageError::Access(_)), "{key}");
        }
    }

    #[test]
    fn http_store_joins_urls() {
        let store = HttpObjectStore::new("https://files.example.org/bucket/", 5).unwrap();
        assert_eq!(
            store.object_url("/u/1/a.pdf"),
            "https://files.example.org/bucket/u/1/a.pdf"
        );
    }
}
