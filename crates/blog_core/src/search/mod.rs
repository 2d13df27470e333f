//! Article search and filtering.
//!
//! # Responsibility
//! - Own the text/tag matching policy over article metadata.
//! - Combine it with structured store filters into one ordered result.
//!
//! # Invariants
//! - Search never mutates the store.
//! - Results keep store insertion order; there is no relevance ranking.

pub mod filter;
