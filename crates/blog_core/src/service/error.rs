//! Caller-facing error taxonomy of the content core.

use crate::authz::AccessDenied;
use crate::model::validation::ValidationError;
use crate::repo::article_repo::RepoError;
use crate::repo::RecordKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error returned by every content use-case.
///
/// No variant is ever returned after a partial write: the failing
/// transaction is rolled back before the error surfaces.
#[derive(Debug)]
pub enum ContentError {
    /// Target id does not resolve.
    NotFound { kind: RecordKind, id: i64 },
    /// Authorization engine denied the action.
    Forbidden(AccessDenied),
    /// Missing or malformed field.
    Validation(ValidationError),
    /// Duplicate unique attribute (username).
    Conflict(String),
    /// Persistence failure.
    Repo(RepoError),
    /// Write succeeded but the read-back did not find the record.
    InconsistentState(&'static str),
}

impl ContentError {
    /// Stable machine-readable code for logs and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_failed",
            Self::Conflict(_) => "conflict",
            Self::Repo(_) => "storage_error",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::Forbidden(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent content state: {details}"),
        }
    }
}

impl Error for ContentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Forbidden(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContentError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Denied(err) => Self::Forbidden(err),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

impl From<AccessDenied> for ContentError {
    fn from(value: AccessDenied) -> Self {
        Self::Forbidden(value)
    }
}

impl From<ValidationError> for ContentError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
