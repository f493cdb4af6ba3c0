//! `launchkit-host`: the tenant runtime host.
//!
//! Takes the textual source of a generated backend application, activates it
//! as a live handler inside this process, and dispatches requests to it by
//! tenant id. Activation is a capability-contract check: the source must
//! declare the conventional `app` entry point, which the manifest compiler
//! turns into a [`TenantHandler`]. A tenant that fails to load stays in the
//! registry as `failed` with its error, so it never silently disappears.
//!
//! Fault isolation rules:
//! - a load-time error marks only that tenant `failed`;
//! - a request-time error becomes a 500 response for that request alone and
//!   leaves the tenant `loaded`.

pub mod handler;
pub mod manifest;
pub mod runtime;

pub use handler::{TenantHandler, TenantInvocationError, TenantRequest, TenantResponse};
pub use manifest::ActivationError;
pub use runtime::{InvokeError, LoadStatus, RuntimeEntrySnapshot, TenantRuntimeHost};
