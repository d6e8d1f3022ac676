use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable selecting the stage for a process run.
pub const STAGE_ENV_VAR: &str = "ENVIRONMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Dev,
    Prod,
}

impl Stage {
    pub const SUPPORTED: [Stage; 2] = [Stage::Dev, Stage::Prod];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Prod)
    }

    /// Source branch the pipeline builds from.
    pub fn source_branch(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "main",
        }
    }

    pub fn allowed_list() -> String {
        Self::SUPPORTED
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Validates a raw stage value. `None` means the variable was not set.
    pub fn resolve(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw {
            None => Err(ConfigError::MissingStage),
            Some(value) => value.parse(),
        }
    }

    /// Reads and validates the stage from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var(STAGE_ENV_VAR).ok();
        Self::resolve(raw.as_deref())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::SUPPORTED
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| ConfigError::InvalidStage {
                value: value.to_string(),
            })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which group of stacks a command operates on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployTarget {
    #[default]
    Web,
    Pipeline,
}

impl DeployTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_supported_stages() {
        assert_eq!(Stage::resolve(Some("dev")).expect("dev is valid"), Stage::Dev);
        assert_eq!(Stage::resolve(Some("prod")).expect("prod is valid"), Stage::Prod);
    }

    #[test]
    fn rejects_unknown_stage_naming_allowed_set() {
        for raw in ["staging", "PROD", "", " dev"] {
            let error = Stage::resolve(Some(raw)).expect_err("unsupported stage should fail");
            assert!(matches!(error, ConfigError::InvalidStage { .. }));
            assert!(error.to_string().contains("Must be one of: dev, prod"));
        }
    }

    #[test]
    fn rejects_missing_stage() {
        let error = Stage::resolve(None).expect_err("missing stage should fail");
        assert!(matches!(error, ConfigError::MissingStage));
        assert_eq!(
            error.to_string(),
            "ENVIRONMENT is not set. Must be one of: dev, prod"
        );
    }

    #[test]
    fn production_builds_from_main() {
        assert!(Stage::Prod.is_production());
        assert!(!Stage::Dev.is_production());
        assert_eq!(Stage::Prod.source_branch(), "main");
        assert_eq!(Stage::Dev.source_branch(), "dev");
    }
}
