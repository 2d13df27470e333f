//! HTTP-shaped surface for the blog core.
//!
//! Transport framing (sockets, header parsing, token issuance) belongs to an
//! outer server; this crate maps de-framed requests onto core use-cases.

pub mod api;
pub mod dto;

pub use api::{ApiRequest, ApiResponse, BlogApi, Method};
