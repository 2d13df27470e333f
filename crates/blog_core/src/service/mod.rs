//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the content-store contract.
//! - Translate repository failures into the caller-facing error taxonomy.
//! - Emit metadata-only logging events for every mutation.
//!
//! # Invariants
//! - Services never bypass repository authorization or validation.
//! - Service layer remains storage-agnostic.

pub mod article_service;
pub mod comment_service;
pub mod error;
pub mod user_service;

use crate::identity::Identity;
use error::ContentError;
use log::{info, warn};

/// Logs one mutation outcome as a `key=value` event line.
pub(crate) fn log_outcome<T>(
    event: &'static str,
    actor: &Identity,
    target: Option<i64>,
    result: &Result<T, ContentError>,
) {
    let target = target.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(_) => info!(
            "event={} module=content status=ok actor={} target={}",
            event,
            actor.log_label(),
            target
        ),
        Err(err) => warn!(
            "event={} module=content status=error actor={} target={} error_code={}",
            event,
            actor.log_label(),
            target,
            err.code()
        ),
    }
}
