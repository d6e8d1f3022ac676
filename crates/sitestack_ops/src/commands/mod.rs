//! One handler per CLI command, dispatched by [`execute`].

pub mod deploy;
pub mod github;
pub mod oidc;
pub mod params;
pub mod publish;

use std::fmt;
use std::path::PathBuf;

use sitestack_core::Command;

use crate::context::{Collaborators, Deployment};

pub use oidc::OidcOutcome;
pub use publish::PublishReport;

/// What a command produced, printed to stdout by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deployed { url: String },
    PipelineDeployed { stack_name: String },
    Published(PublishReport),
    ParametersUploaded(Vec<String>),
    VariablesSet,
    Oidc(OidcOutcome),
    Synthesized(Vec<PathBuf>),
    Destroyed(Vec<String>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployed { url } => write!(f, "{url}"),
            Self::PipelineDeployed { stack_name } => write!(f, "Deployed pipeline stack {stack_name}"),
            Self::Published(report) => write!(
                f,
                "Uploaded {} files to {}; invalidation {} created for {}",
                report.uploaded_keys.len(),
                report.bucket,
                report.invalidation_id.as_deref().unwrap_or(report.caller_reference.as_str()),
                report.distribution_id
            ),
            Self::ParametersUploaded(names) => write!(f, "Uploaded {} parameters", names.len()),
            Self::VariablesSet => write!(f, "Repository variables set"),
            Self::Oidc(outcome) => write!(f, "{outcome}"),
            Self::Synthesized(paths) => {
                write!(f, "Synthesized {} templates", paths.len())?;
                for path in paths {
                    write!(f, "\n  {}", path.display())?;
                }
                Ok(())
            }
            Self::Destroyed(stacks) => write!(f, "Destroyed {}", stacks.join(", ")),
        }
    }
}

pub async fn execute(
    command: Command,
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<Outcome> {
    tracing::info!(command = command.name(), stage = %deployment.stage, "running");
    Ok(match command {
        Command::Deploy => Outcome::Deployed {
            url: deploy::deploy(deployment, collaborators).await?,
        },
        Command::DeployPipeline => Outcome::PipelineDeployed {
            stack_name: deploy::deploy_pipeline(deployment, collaborators).await?,
        },
        Command::Publish => Outcome::Published(publish::publish(deployment, collaborators).await?),
        Command::SsmUpload => {
            Outcome::ParametersUploaded(params::ssm_upload(deployment, collaborators).await?)
        }
        Command::GithubVars => {
            github::github_vars(deployment, collaborators).await?;
            Outcome::VariablesSet
        }
        Command::SetupOidc => Outcome::Oidc(oidc::setup_oidc(collaborators).await?),
        Command::Synth => Outcome::Synthesized(deploy::synth(deployment, collaborators).await?),
        Command::Destroy => Outcome::Destroyed(deploy::destroy(deployment, collaborators).await?),
    })
}
