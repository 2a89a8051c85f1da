//! Request handlers module

pub mod auth;
pub mod division;
pub mod documentation;
pub mod file;
pub mod link;
pub mod pengurus;
pub mod profile_desc;
pub mod schedule;
pub mod surat_outgoing;
pub mod surat_request;

use std::collections::BTreeMap;

use axum::extract::Multipart;

use crate::error::{AppError, AppResult};
use crate::storage::{self, UploadKind};
use crate::validation::Validator;

/// A file field pulled out of a multipart body
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus the (single) file field of a multipart form
pub(crate) struct FormData {
    fields: BTreeMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl FormData {
    /// Drain a multipart body; `file_field` names the file-valued field
    pub async fn read(mut multipart: Multipart, file_field: &str) -> AppResult<Self> {
        let mut fields = BTreeMap::new();
        let mut file = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(|n| n.to_string()) else {
                continue;
            };

            if name == file_field {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
                // An empty file part means the field was not really sent
                if !file_name.is_empty() && !bytes.is_empty() {
                    file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
                fields.insert(name, text);
            }
        }

        Ok(Self { fields, file })
    }

    /// Text field value; `Some` even when the client sent an empty string
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// Whether the client sent the field at all
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Validate an uploaded file against kind, presence, and size rules
pub(crate) fn validate_file(
    v: &mut Validator,
    field: &str,
    file: Option<&UploadedFile>,
    kind: UploadKind,
    required: bool,
    max_bytes: usize,
) {
    let Some(file) = file else {
        if required {
            v.fail(field, format!("The {} field is required.", field));
        }
        return;
    };

    let allowed = storage::extension_of(&file.file_name)
        .map(|ext| kind.allowed_extensions().contains(&ext.as_str()))
        .unwrap_or(false);
    if !allowed {
        v.fail(field, kind.type_message(field));
    }

    if file.bytes.len() > max_bytes {
        v.fail(
            field,
            format!(
                "The {} field may not be greater than {} kilobytes.",
                field,
                max_bytes / 1024
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn test_required_file_missing() {
        let mut v = Validator::new();
        validate_file(&mut v, "foto", None, UploadKind::Image, true, 1024);
        assert!(!v.is_ok());
    }

    #[test]
    fn test_optional_file_missing() {
        let mut v = Validator::new();
        validate_file(&mut v, "foto", None, UploadKind::Image, false, 1024);
        assert!(v.is_ok());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let mut v = Validator::new();
        let file = upload("letter.pdf", 10);
        validate_file(&mut v, "foto", Some(&file), UploadKind::Image, true, 1024);
        assert!(!v.is_ok());

        let mut v = Validator::new();
        let file = upload("photo.png", 10);
        validate_file(&mut v, "file_surat", Some(&file), UploadKind::Document, true, 1024);
        assert!(!v.is_ok());
    }

    #[test]
    fn test_rejects_oversized_file() {
        let mut v = Validator::new();
        let file = upload("photo.png", 2049);
        validate_file(&mut v, "foto", Some(&file), UploadKind::Image, true, 2048);
        assert!(!v.is_ok());
    }

    #[test]
    fn test_accepts_valid_file() {
        let mut v = Validator::new();
        let file = upload("photo.jpeg", 2048);
        validate_file(&mut v, "foto", Some(&file), UploadKind::Image, true, 2048);
        assert!(v.is_ok());

        let mut v = Validator::new();
        let file = upload("surat.docx", 100);
        validate_file(&mut v, "file_surat", Some(&file), UploadKind::Document, true, 2048);
        assert!(v.is_ok());
    }
}
