//! `launchkit-pipeline`: the generation pipeline.
//!
//! One [`job::Job`] models one run of the fixed five-stage pipeline
//! (discovery, build, package, enrich, finalize, in that order). The
//! [`driver::PipelineDriver`] executes it on its own task, calling the
//! external [`collaborators::Collaborators`] one stage at a time, and on
//! success hands the generated application over to the store and the
//! runtime host. Jobs live in memory only; tenants are the durable output.

pub mod collaborators;
pub mod driver;
pub mod job;
pub mod registry;

pub use collaborators::{CollaboratorError, Collaborators, ScriptedCollaborators, Stage};
pub use driver::PipelineDriver;
pub use job::{Job, JobStatus, LogEntry, Severity, Step, StepStatus};
pub use registry::JobRegistry;
