use std::path::PathBuf;

use thiserror::Error;

use crate::stage::{Stage, STAGE_ENV_VAR};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} is not set. Must be one of: {}", STAGE_ENV_VAR, Stage::allowed_list())]
    MissingStage,

    #[error(
        "Invalid {} \"{value}\". Must be one of: {}",
        STAGE_ENV_VAR,
        Stage::allowed_list()
    )]
    InvalidStage { value: String },

    #[error(
        "Missing bootstrap config: {}\nAdd to {} or set in CI environment.",
        .missing.join(", "),
        .path.display()
    )]
    MissingKeys { missing: Vec<String>, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    UnreadableEnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("pipeline stack for {stage} requires GITHUB_OWNER and GITHUB_REPO")]
    MissingSourceRepo { stage: Stage },
}

/// Actions that are refused outright on production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Production deploy must go through CI/CD pipeline")]
    DirectProductionDeploy,

    #[error("Production destroy not allowed")]
    ProductionDestroy,
}
