//! Domain model for articles and comments.
//!
//! # Responsibility
//! - Define the records owned by the content store.
//! - Validate caller input before any persistence happens.
//!
//! # Invariants
//! - Every record has a server-assigned, monotonic `i64` id that is never
//!   reused.
//! - Authors are fixed at creation time.

pub mod article;
pub mod comment;
pub mod validation;
