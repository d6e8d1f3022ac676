//! Shared static-site stack domain primitives.
//!
//! This crate owns stage resolution, bootstrap configuration, command policy
//! and the declarative stack templates. It intentionally excludes AWS SDK and
//! async runtime concerns; those live in `sitestack_ops`.

pub mod bootstrap;
pub mod command;
pub mod content_type;
pub mod error;
pub mod params;
pub mod project;
pub mod stacks;
pub mod stage;

pub use bootstrap::{BootstrapEnv, BootstrapLoader, SourceRepo};
pub use command::Command;
pub use error::{ConfigError, PolicyViolation};
pub use project::ProjectConfig;
pub use stage::{DeployTarget, Stage};
