//! Bootstrap configuration for one stage.
//!
//! Locally the values come from `infrastructure/.env.<stage>`; in CI they are
//! set as process environment variables. Environment values always override
//! file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::project::ProjectConfig;
use crate::stage::{DeployTarget, Stage};

pub const ACCOUNT_KEY: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_KEY: &str = "CDK_DEFAULT_REGION";
pub const DOMAIN_KEY: &str = "PROD_DOMAIN_NAME";
pub const CERTIFICATE_KEY: &str = "CERTIFICATE_ARN";
pub const GITHUB_OWNER_KEY: &str = "GITHUB_OWNER";
pub const GITHUB_REPO_KEY: &str = "GITHUB_REPO";
pub const GITHUB_TOKEN_SECRET_KEY: &str = "GITHUB_TOKEN_SECRET_NAME";

/// Resolved bootstrap values. Optional fields are `None` when unset or empty,
/// which consumers read as "feature disabled".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapEnv {
    pub account: String,
    pub region: String,
    pub domain_name: Option<String>,
    pub certificate_arn: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_token_secret_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRepo<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomDomain<'a> {
    pub domain_name: &'a str,
    pub certificate_arn: &'a str,
}

impl BootstrapEnv {
    /// Both owner and repo must be set for the pipeline stack to exist.
    pub fn source_repo(&self) -> Option<SourceRepo<'_>> {
        match (self.github_owner.as_deref(), self.github_repo.as_deref()) {
            (Some(owner), Some(repo)) => Some(SourceRepo { owner, repo }),
            _ => None,
        }
    }

    pub fn custom_domain(&self) -> Option<CustomDomain<'_>> {
        match (self.domain_name.as_deref(), self.certificate_arn.as_deref()) {
            (Some(domain_name), Some(certificate_arn)) => Some(CustomDomain {
                domain_name,
                certificate_arn,
            }),
            _ => None,
        }
    }
}

pub fn required_keys(stage: Stage, target: DeployTarget) -> Vec<&'static str> {
    let mut required = vec![ACCOUNT_KEY, REGION_KEY];
    if stage.is_production() && target == DeployTarget::Web {
        required.extend([DOMAIN_KEY, CERTIFICATE_KEY]);
    }
    required
}

/// Parses a dotenv file. A missing file yields an empty mapping.
///
/// Lines that are not `KEY=value` are skipped; only I/O failures are errors.
/// Unquoted and double-quoted values expand `$VAR` and `${VAR}`; single-quote
/// a value to keep it verbatim.
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let unreadable = |source| ConfigError::UnreadableEnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut values = BTreeMap::new();
    for item in dotenvy::from_path_iter(path).map_err(unreadable)? {
        match item {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(dotenvy::Error::LineParse(..)) => continue,
            Err(error) => return Err(unreadable(error)),
        }
    }
    Ok(values)
}

/// Snapshot of the current process environment.
pub fn process_environment() -> BTreeMap<String, String> {
    std::env::vars().collect()
}

#[derive(Debug, Clone)]
pub struct BootstrapLoader {
    stage: Stage,
    env_file: PathBuf,
}

impl BootstrapLoader {
    pub fn new(project: &ProjectConfig, stage: Stage) -> Self {
        Self {
            stage,
            env_file: project.env_file(stage),
        }
    }

    /// Merges the env file with `environment` and validates the result.
    pub fn load(
        &self,
        target: DeployTarget,
        environment: &BTreeMap<String, String>,
    ) -> Result<BootstrapEnv, ConfigError> {
        let mut merged = read_env_file(&self.env_file)?;
        for (key, value) in environment {
            merged.insert(key.clone(), value.clone());
        }

        self.validate(target, &merged)?;

        let required = |key: &str| lookup(&merged, key).unwrap_or_default();
        Ok(BootstrapEnv {
            account: required(ACCOUNT_KEY),
            region: required(REGION_KEY),
            domain_name: lookup(&merged, DOMAIN_KEY),
            certificate_arn: lookup(&merged, CERTIFICATE_KEY),
            github_owner: lookup(&merged, GITHUB_OWNER_KEY),
            github_repo: lookup(&merged, GITHUB_REPO_KEY),
            github_token_secret_name: lookup(&merged, GITHUB_TOKEN_SECRET_KEY),
        })
    }

    fn validate(
        &self,
        target: DeployTarget,
        merged: &BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        let missing: Vec<String> = required_keys(self.stage, target)
            .into_iter()
            .filter(|key| lookup(merged, key).is_none())
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys {
                missing,
                path: self.env_file.clone(),
            })
        }
    }
}

fn lookup(values: &BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
}
