use std::collections::BTreeMap;

use sitestack_core::{BootstrapEnv, BootstrapLoader, Command, ProjectConfig, Stage};

use crate::adapters::{
    CdnInvalidator, CommandRunner, IdentityProviderRegistry, ObjectStore, ParameterStore,
    StackOutputReader,
};

/// Everything a command needs to know about where it is deploying.
///
/// Built once per process, before any external call, and passed by
/// reference to every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub project: ProjectConfig,
    pub stage: Stage,
    pub bootstrap: BootstrapEnv,
}

impl Deployment {
    /// Checks the production policy for `command`, then loads bootstrap
    /// values for the command's target. Nothing is read from disk when the
    /// policy rejects the command.
    pub fn prepare(
        project: ProjectConfig,
        stage: Stage,
        command: Command,
        environment: &BTreeMap<String, String>,
    ) -> anyhow::Result<Self> {
        command.ensure_allowed(stage)?;
        let bootstrap = BootstrapLoader::new(&project, stage).load(command.target(), environment)?;
        Ok(Self {
            project,
            stage,
            bootstrap,
        })
    }

    pub fn web_stack_name(&self) -> String {
        self.project.web_stack_name(self.stage)
    }
}

/// External collaborators, one trait object per seam.
pub struct Collaborators {
    pub runner: Box<dyn CommandRunner>,
    pub objects: Box<dyn ObjectStore>,
    pub cdn: Box<dyn CdnInvalidator>,
    pub outputs: Box<dyn StackOutputReader>,
    pub parameters: Box<dyn ParameterStore>,
    pub identity: Box<dyn IdentityProviderRegistry>,
}
