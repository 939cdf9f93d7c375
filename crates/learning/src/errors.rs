//! Error taxonomy for the learning-platform domain.
//!
//! [`LearningError`] is what every workflow operation returns on failure. Each
//! variant belongs to exactly one [`ErrorKind`], and each kind maps to one
//! boundary status code. Storage adapters raise [`crate::StoreError`], which
//! converts into the matching [`LearningError`] variant.
//!
//! ## Boundary mapping
//!
//! | Kind | Status |
//! |------|--------|
//! | `NotFound` | 404 |
//! | `BadRequest` (incl. validation) | 400 |
//! | `Forbidden` | 403 |
//! | `Conflict` | 409 |
//! | `Internal` | 500 |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StoreError;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Coarse classification of a [`LearningError`], used by the boundary layer
/// to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Forbidden,
    Internal,
}

impl ErrorKind {
    /// HTTP status code the boundary layer responds with for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Field-level validation failures, aggregated rather than reported one at a
/// time. Keys are field names, values are human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`. The first message recorded for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Records a failure for `field` when `failed` is true.
    pub fn check(&mut self, failed: bool, field: &str, message: &str) {
        if failed {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Converts the collected failures into a result: `Ok(())` when nothing
    /// was recorded, otherwise [`LearningError::Validation`].
    pub fn into_result(self) -> Result<(), LearningError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LearningError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Workflow errors
// ---------------------------------------------------------------------------

/// Failure raised by a workflow operation.
///
/// Workflows raise the most specific variant available and never swallow a
/// failure. No variant is retried by the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LearningError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity set name (e.g. `"course"`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Malformed or out-of-range input (score outside range, rating outside 1–5).
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// One or more input fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Duplicate natural key or invalid state transition.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Authorization or precondition failure (e.g. reviewing without enrollment).
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Unclassified failure, typically from a storage backend.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LearningError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Shorthand for a single-field validation failure.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest { .. } | Self::Validation(_) => ErrorKind::BadRequest,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Field-level failures, when this is a validation error.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<StoreError> for LearningError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::RowNotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::UniqueViolation { constraint, key } => {
                Self::conflict(format!("{constraint} already exists for {key}"))
            }
            StoreError::Integrity { message } => Self::Conflict { message },
            StoreError::Backend { message } => Self::Internal { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_boundary_mapping() {
        assert_eq!(LearningError::not_found("course", "c1").status_code(), 404);
        assert_eq!(LearningError::bad_request("x").status_code(), 400);
        assert_eq!(
            LearningError::invalid_field("email", "bad").status_code(),
            400
        );
        assert_eq!(LearningError::forbidden("x").status_code(), 403);
        assert_eq!(LearningError::conflict("x").status_code(), 409);
        assert_eq!(LearningError::internal("x").status_code(), 500);
    }

    #[test]
    fn validation_errors_aggregate_every_field() {
        let mut errors = ValidationErrors::new();
        errors.check(true, "name", "must not be empty");
        errors.check(false, "bio", "unused");
        errors.check(true, "email", "must contain '@'");
        errors.check(true, "email", "second message is ignored");

        let err = errors.into_result().expect_err("two fields failed");
        let fields = err.field_errors().expect("validation variant");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("email"), Some("must contain '@'"));
        assert_eq!(fields.get("name"), Some("must not be empty"));
    }

    #[test]
    fn store_errors_map_to_specific_kinds() {
        let unique: LearningError = StoreError::UniqueViolation {
            constraint: "enrollment",
            key: "course/student".into(),
        }
        .into();
        assert_eq!(unique.kind(), ErrorKind::Conflict);

        let missing: LearningError = StoreError::RowNotFound {
            entity: "user",
            id: "u1".into(),
        }
        .into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let backend: LearningError = StoreError::Backend {
            message: "disk full".into(),
        }
        .into();
        assert_eq!(backend.kind(), ErrorKind::Internal);
    }
}
