//! `launchkit-store`: durable records of generated tenant applications.
//!
//! Tenants (unlike jobs) survive process restarts: the runtime host
//! re-hydrates every stored record at startup. The store is append-only from
//! the caller's point of view; regeneration creates a new tenant id rather
//! than mutating an existing record.

pub mod record;
pub mod store;

pub use record::TenantRecord;
pub use store::{FsTenantStore, InMemoryTenantStore, StoreError, TenantStore};
