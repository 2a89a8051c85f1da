//! Disk-backed store for uploaded files
//!
//! Files land under the configured storage root in per-resource
//! subdirectories, with UUID file names to avoid collisions. Deletes are
//! best-effort: a record update never fails because its old file is gone.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Extensions accepted for photo uploads
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "png", "jpg", "gif"];

/// Extensions accepted for letter document uploads
pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// What kind of file an upload field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => &IMAGE_EXTENSIONS,
            UploadKind::Document => &DOCUMENT_EXTENSIONS,
        }
    }

    /// Validation message when the extension is rejected
    pub fn type_message(self, field: &str) -> String {
        match self {
            UploadKind::Image => format!(
                "The {} field must be a file of type: jpeg, png, jpg, gif.",
                field
            ),
            UploadKind::Document => format!(
                "The {} field must be a file of type: pdf, doc, docx.",
                field
            ),
        }
    }
}

/// File store rooted at the configured storage directory
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store bytes under `dir`, keeping the original extension.
    /// Returns the relative path, e.g. `pengurus/3f1a....jpg`.
    pub async fn save(&self, dir: &str, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        let ext = extension_of(original_name)
            .ok_or_else(|| AppError::BadRequest("File has no extension".to_string()))?;
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        let rel = format!("{}/{}", dir, file_name);

        let target_dir = self.root.join(dir);
        fs::create_dir_all(&target_dir).await?;
        fs::write(target_dir.join(&file_name), bytes).await?;

        Ok(rel)
    }

    /// Remove a previously stored file. Missing files are logged, not errors.
    pub async fn delete(&self, rel: &str) {
        let Some(path) = self.resolve(rel) else {
            tracing::warn!("Refusing to delete unsafe path: {}", rel);
            return;
        };
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!("Failed to delete stored file {}: {}", rel, e);
        }
    }

    /// Read a stored file, 404 if absent
    pub async fn read(&self, rel: &str) -> AppResult<Vec<u8>> {
        let path = self
            .resolve(rel)
            .ok_or_else(|| AppError::NotFound("File tidak ditemukan.".to_string()))?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File tidak ditemukan.".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a relative path inside the root, rejecting traversal
    pub fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let rel_path = Path::new(rel);
        let safe = rel_path.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe || rel.is_empty() {
            return None;
        }
        Some(self.root.join(rel_path))
    }
}

/// Lower-cased extension of a file name
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// MIME type for a stored file, from its extension
pub fn mime_type(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_table() {
        assert_eq!(mime_type("surat_requests/a.pdf"), "application/pdf");
        assert_eq!(mime_type("a.doc"), "application/msword");
        assert_eq!(
            mime_type("a.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_type("pengurus/b.JPG"), "image/jpeg");
        assert_eq!(mime_type("b.jpeg"), "image/jpeg");
        assert_eq!(mime_type("b.png"), "image/png");
        assert_eq!(mime_type("b.gif"), "image/gif");
        assert_eq!(mime_type("b.exe"), "application/octet-stream");
        assert_eq!(mime_type("no_extension"), "application/octet-stream");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("foto.PNG"), Some("png".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("none"), None);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = FileStore::new("/tmp/kbmk-store");
        assert!(store.resolve("pengurus/a.jpg").is_some());
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("pengurus/../../etc/passwd").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("").is_none());
    }

    #[tokio::test]
    async fn test_save_read_delete_roundtrip() {
        let root = std::env::temp_dir().join(format!("kbmk-store-{}", Uuid::new_v4()));
        let store = FileStore::new(&root);

        let rel = store.save("docs", "letter.pdf", b"%PDF-1.4").await.unwrap();
        assert!(rel.starts_with("docs/"));
        assert!(rel.ends_with(".pdf"));

        let bytes = store.read(&rel).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");

        store.delete(&rel).await;
        assert!(matches!(store.read(&rel).await, Err(AppError::NotFound(_))));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = FileStore::new(std::env::temp_dir());
        let result = store.read("does-not-exist/x.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
