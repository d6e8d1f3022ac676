use crate::error::PolicyViolation;
use crate::stage::{DeployTarget, Stage};

/// Operations exposed by the orchestration CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Deploy,
    DeployPipeline,
    Publish,
    SsmUpload,
    GithubVars,
    SetupOidc,
    Synth,
    Destroy,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Deploy,
        Command::DeployPipeline,
        Command::Publish,
        Command::SsmUpload,
        Command::GithubVars,
        Command::SetupOidc,
        Command::Synth,
        Command::Destroy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::DeployPipeline => "deploy-pipeline",
            Self::Publish => "publish",
            Self::SsmUpload => "ssm-upload",
            Self::GithubVars => "github-vars",
            Self::SetupOidc => "setup-oidc",
            Self::Synth => "synth",
            Self::Destroy => "destroy",
        }
    }

    /// Stack group the command synthesizes and validates bootstrap keys for.
    pub fn target(self) -> DeployTarget {
        match self {
            Self::DeployPipeline => DeployTarget::Pipeline,
            _ => DeployTarget::Web,
        }
    }

    /// Production only changes through the pipeline.
    pub fn ensure_allowed(self, stage: Stage) -> Result<(), PolicyViolation> {
        if !stage.is_production() {
            return Ok(());
        }
        match self {
            Self::Deploy => Err(PolicyViolation::DirectProductionDeploy),
            Self::Destroy => Err(PolicyViolation::ProductionDestroy),
            _ => Ok(()),
        }
    }
}
