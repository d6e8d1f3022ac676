//! Orchestration for static-site stacks: the provisioning engine, AWS
//! adapters and one handler per CLI command.

pub mod adapters;
pub mod aws;
pub mod commands;
pub mod context;
pub mod engine;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use commands::{execute, Outcome};
pub use context::{Collaborators, Deployment};
