//! Field-keyed request validation
//!
//! Collects per-field error messages and converts them into a 422 response
//! body of the shape `{"errors": {"field": ["msg", ...]}}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Accumulated validation errors, keyed by field name
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.errors.keys().map(|k| k.as_str()).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Builder for validating request fields one rule at a time
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field must be present and non-empty
    pub fn required(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => {
                self.errors
                    .add(field, format!("The {} field is required.", field));
            }
        }
        self
    }

    /// Field, when present, must not exceed `max` characters
    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.errors.add(
                    field,
                    format!("The {} field may not be greater than {} characters.", field, max),
                );
            }
        }
        self
    }

    /// Field, when present, must look like an email address
    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if !looks_like_email(v) {
                self.errors
                    .add(field, format!("The {} field must be a valid email address.", field));
            }
        }
        self
    }

    /// Field must have at least `min` characters
    pub fn min_len(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.errors.add(
                    field,
                    format!("The {} field must be at least {} characters.", field, min),
                );
            }
        }
        self
    }

    /// Field, when present, must be one of the allowed values
    pub fn one_of(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) -> &mut Self {
        if let Some(v) = value {
            if !allowed.contains(&v) {
                self.errors
                    .add(field, format!("The selected {} is invalid.", field));
            }
        }
        self
    }

    /// Field, when present, must parse as `YYYY-MM-DD`
    pub fn date(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if chrono::NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err() {
                self.errors
                    .add(field, format!("The {} field must be a valid date.", field));
            }
        }
        self
    }

    /// Record an arbitrary failure against a field
    pub fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.add(field, message);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert accumulated errors into a 422, or pass
    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_missing() {
        let mut v = Validator::new();
        v.required("nama", None);
        let err = v.finish().unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.contains("nama")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_required_blank() {
        let mut v = Validator::new();
        v.required("perihal", Some("   "));
        assert!(!v.is_ok());
    }

    #[test]
    fn test_max_len() {
        let long = "x".repeat(51);
        let mut v = Validator::new();
        v.max_len("nama", Some(&long), 50);
        assert!(!v.is_ok());

        let mut v = Validator::new();
        v.max_len("nama", Some("ok"), 50);
        assert!(v.is_ok());
    }

    #[test]
    fn test_email() {
        let mut v = Validator::new();
        v.email("email", Some("not-an-email"));
        assert!(!v.is_ok());

        let mut v = Validator::new();
        v.email("email", Some("user@example.com"));
        assert!(v.is_ok());
    }

    #[test]
    fn test_one_of() {
        let mut v = Validator::new();
        v.one_of("status", Some("pending"), &["diproses", "selesai"]);
        assert!(!v.is_ok());

        let mut v = Validator::new();
        v.one_of("status", Some("selesai"), &["diproses", "selesai"]);
        assert!(v.is_ok());
    }

    #[test]
    fn test_date() {
        let mut v = Validator::new();
        v.date("tanggal", Some("2024-10-20"));
        assert!(v.is_ok());

        let mut v = Validator::new();
        v.date("tanggal", Some("20-10-2024"));
        assert!(!v.is_ok());
    }

    #[test]
    fn test_multiple_messages_per_field() {
        let mut v = Validator::new();
        v.required("password", Some("abc"));
        v.min_len("password", Some("abc"), 6);
        let err = v.finish().unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert!(errors.contains("password"));
                assert!(!errors.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
