use std::path::{Path, PathBuf};

use crate::stage::Stage;

pub const DEFAULT_PROJECT_NAME: &str = "static-site";

/// Project identity and on-disk layout.
///
/// Every stack, bucket and parameter name is derived from the project name
/// and the stage, so two stages of the same project never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: String,
    pub root: PathBuf,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn infrastructure_dir(&self) -> PathBuf {
        self.root.join("infrastructure")
    }

    pub fn env_file(&self, stage: Stage) -> PathBuf {
        self.infrastructure_dir().join(format!(".env.{stage}"))
    }

    pub fn site_out_dir(&self) -> PathBuf {
        self.root.join("frontend").join("out")
    }

    pub fn template_dir(&self) -> PathBuf {
        self.infrastructure_dir().join("cfn.out")
    }

    pub fn template_path(&self, stack_name: &str) -> PathBuf {
        template_file(&self.template_dir(), stack_name)
    }

    pub fn web_stack_name(&self, stage: Stage) -> String {
        format!("{}-web-{stage}", self.name)
    }

    pub fn web_bucket_name(&self, stage: Stage) -> String {
        self.web_stack_name(stage)
    }

    pub fn pipeline_stack_name(&self, stage: Stage) -> String {
        format!("{}-pipeline-{stage}", self.name)
    }

    pub fn artifacts_bucket_name(&self, stage: Stage) -> String {
        format!("{}-pipeline-artifacts-{stage}", self.name)
    }

    pub fn build_project_name(&self, stage: Stage) -> String {
        format!("{}-build-{stage}", self.name)
    }

    pub fn github_actions_role_name(&self, stage: Stage) -> String {
        format!("{}-github-actions-{stage}", self.name)
    }

    pub fn default_token_secret_name(&self) -> String {
        format!("{}/github-token", self.name)
    }

    pub fn parameter_prefix(&self, stage: Stage) -> String {
        format!("/{}/{stage}", self.name)
    }

    /// Parameter-store path for a key uploaded from the stage env file.
    pub fn stack_parameter_name(&self, stage: Stage, key: &str) -> String {
        format!("{}/stack/{key}", self.parameter_prefix(stage))
    }
}

fn template_file(dir: &Path, stack_name: &str) -> PathBuf {
    dir.join(format!("{stack_name}.template.json"))
}
