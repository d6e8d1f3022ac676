//! Provisioning engine: CloudFormation driven through the `aws` CLI.
//!
//! Templates are synthesized in-process and written under
//! `infrastructure/cfn.out/`; the CLI owns change sets, ordering and
//! convergence.

use std::path::PathBuf;

use anyhow::Context;
use sitestack_core::stacks::StackTemplate;

use crate::adapters::{CommandRunner, Invocation};
use crate::context::Deployment;

pub const ENGINE_PROGRAM: &str = "aws";

pub struct CloudFormationCli<'a> {
    deployment: &'a Deployment,
    runner: &'a dyn CommandRunner,
}

impl<'a> CloudFormationCli<'a> {
    pub fn new(deployment: &'a Deployment, runner: &'a dyn CommandRunner) -> Self {
        Self { deployment, runner }
    }

    /// Writes each template to its file and returns the paths in order.
    pub async fn write_templates(&self, stacks: &[StackTemplate]) -> anyhow::Result<Vec<PathBuf>> {
        let project = &self.deployment.project;
        let dir = project.template_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut paths = Vec::with_capacity(stacks.len());
        for stack in stacks {
            let path = project.template_path(&stack.stack_name);
            let body = stack
                .to_json_pretty()
                .with_context(|| format!("failed to serialize template {}", stack.stack_name))?;
            tokio::fs::write(&path, body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(stack = %stack.stack_name, path = %path.display(), "template written");
            paths.push(path);
        }
        Ok(paths)
    }

    pub async fn synth(&self, stacks: &[StackTemplate]) -> anyhow::Result<Vec<PathBuf>> {
        let paths = self.write_templates(stacks).await?;
        for path in &paths {
            let template_body = format!("file://{}", path.display());
            self.aws(vec![
                "cloudformation",
                "validate-template",
                "--template-body",
                &template_body,
            ])
            .await?;
        }
        Ok(paths)
    }

    pub async fn deploy(&self, stacks: &[StackTemplate]) -> anyhow::Result<()> {
        let paths = self.write_templates(stacks).await?;
        let project_tag = format!("project={}", self.deployment.project.name);
        let stage_tag = format!("stage={}", self.deployment.stage);

        for (stack, path) in stacks.iter().zip(&paths) {
            tracing::info!(stack = %stack.stack_name, "deploying stack");
            let template_file = path.display().to_string();
            self.aws(vec![
                "cloudformation",
                "deploy",
                "--stack-name",
                &stack.stack_name,
                "--template-file",
                &template_file,
                "--capabilities",
                "CAPABILITY_NAMED_IAM",
                "--no-fail-on-empty-changeset",
                "--tags",
                &project_tag,
                &stage_tag,
            ])
            .await?;
        }
        Ok(())
    }

    /// Deletes stacks in reverse creation order, waiting for each.
    pub async fn destroy(&self, stack_names: &[String]) -> anyhow::Result<()> {
        for stack_name in stack_names.iter().rev() {
            tracing::info!(stack = %stack_name, "deleting stack");
            self.aws(vec!["cloudformation", "delete-stack", "--stack-name", stack_name])
                .await?;
            self.aws(vec![
                "cloudformation",
                "wait",
                "stack-delete-complete",
                "--stack-name",
                stack_name,
            ])
            .await?;
        }
        Ok(())
    }

    async fn aws(&self, mut args: Vec<&str>) -> anyhow::Result<()> {
        args.extend(["--region", self.deployment.bootstrap.region.as_str()]);
        let invocation = Invocation::new(ENGINE_PROGRAM, args, &self.deployment.project.root);
        self.runner.run(&invocation).await
    }
}
