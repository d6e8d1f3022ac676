//! Declarative stack definitions.
//!
//! Each stack is a plain function from project, stage and bootstrap values to
//! a CloudFormation template. Convergence belongs to the provisioning engine.

pub mod pipeline;
pub mod template;
pub mod web;

use crate::bootstrap::BootstrapEnv;
use crate::error::ConfigError;
use crate::project::ProjectConfig;
use crate::stage::{DeployTarget, Stage};

pub use template::{RemovalPolicy, StackTemplate, Template};
pub use web::WebOutput;

/// Stacks of one deploy target, in creation order.
///
/// The web target carries the web stack; the pipeline stack joins either
/// target whenever a source repo is configured.
pub fn synthesize(
    project: &ProjectConfig,
    stage: Stage,
    target: DeployTarget,
    bootstrap: &BootstrapEnv,
) -> Vec<StackTemplate> {
    let mut stacks = Vec::with_capacity(2);
    if target == DeployTarget::Web {
        stacks.push(web::web_stack(project, stage, bootstrap));
    }
    if let Some(source) = bootstrap.source_repo() {
        stacks.push(pipeline::pipeline_stack(project, stage, bootstrap, source));
    }
    stacks
}

/// The pipeline stack alone, or an error when no source repo is configured.
pub fn pipeline_only(
    project: &ProjectConfig,
    stage: Stage,
    bootstrap: &BootstrapEnv,
) -> Result<StackTemplate, ConfigError> {
    synthesize(project, stage, DeployTarget::Pipeline, bootstrap)
        .into_iter()
        .find(|stack| stack.stack_name == project.pipeline_stack_name(stage))
        .ok_or(ConfigError::MissingSourceRepo { stage })
}
