//! `launchkit-core`: shared domain primitives.
//!
//! Identifiers and the domain error model used by every other crate. Keep
//! this crate free of infrastructure concerns (no HTTP, no storage).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{JobId, TenantId};
