//! Document reference resolution.
//!
//! A reference must name a readable, non-empty regular file. Anything else
//! is a `DocumentError`, which the extractor reports as `NotFound`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::providers::Attachment;

/// Magic bytes at the start of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("No document reference was provided.")]
    EmptyReference,

    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("Document reference is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Document could not be read: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document is empty: {0}")]
    Empty(PathBuf),
}

/// A resolved document, ready to hand to the model.
#[derive(Clone)]
pub struct Document {
    reference: String,
    path: PathBuf,
    mime_type: &'static str,
    bytes: Arc<[u8]>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("reference", &self.reference)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Document {
    /// Build a document from bytes already in memory.
    pub fn from_bytes(reference: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let reference = reference.into();
        let bytes = bytes.into();
        Self {
            path: PathBuf::from(&reference),
            mime_type: sniff_mime_type(&bytes),
            reference,
            bytes,
        }
    }

    /// The reference exactly as the user supplied it.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    pub fn attachment(&self) -> Attachment {
        Attachment::new(self.mime_type, Arc::clone(&self.bytes))
    }
}

fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PDF_MAGIC) {
        "application/pdf"
    } else {
        "text/plain"
    }
}

/// Resolve a user-supplied reference to a readable document.
pub async fn resolve(reference: &str) -> Result<Document, DocumentError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(DocumentError::EmptyReference);
    }
    let path = PathBuf::from(trimmed);

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocumentError::NotFound(path))
        }
        Err(source) => return Err(DocumentError::Unreadable { path, source }),
    };

    if !metadata.is_file() {
        return Err(DocumentError::NotAFile(path));
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(source) => return Err(DocumentError::Unreadable { path, source }),
    };

    if bytes.is_empty() {
        return Err(DocumentError::Empty(path));
    }

    let document = Document {
        reference: trimmed.to_string(),
        mime_type: sniff_mime_type(&bytes),
        bytes: bytes.into(),
        path,
    };

    tracing::debug!(
        reference = %document.reference,
        mime_type = document.mime_type,
        bytes = document.len(),
        "Document resolved"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_resolves_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n...").unwrap();

        let document = resolve(file.path().to_str().unwrap()).await.unwrap();
        assert!(document.is_pdf());
        assert_eq!(document.len(), 12);
        assert_eq!(document.attachment().mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_plain_text_is_accepted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"SERVICE AGREEMENT between A and B").unwrap();

        let document = resolve(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(document.mime_type(), "text/plain");
    }

    #[tokio::test]
    async fn test_empty_reference() {
        assert!(matches!(resolve("   ").await, Err(DocumentError::EmptyReference)));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            resolve(missing.to_str().unwrap()).await,
            Err(DocumentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve(dir.path().to_str().unwrap()).await,
            Err(DocumentError::NotAFile(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_byte_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            resolve(file.path().to_str().unwrap()).await,
            Err(DocumentError::Empty(_))
        ));
    }

    #[test]
    fn test_debug_hides_content() {
        let document = Document::from_bytes("contract.pdf", b"%PDF-secret terms".to_vec());
        let debug = format!("{:?}", document);
        assert!(!debug.contains("secret"));
        assert!(document.is_pdf());
    }
}
