use std::path::PathBuf;

use sitestack_core::stacks::{pipeline_only, synthesize, StackTemplate, WebOutput};
use sitestack_core::{Command, DeployTarget};

use super::publish::publish;
use crate::adapters::{require_output, ObjectStore};
use crate::context::{Collaborators, Deployment};
use crate::engine::CloudFormationCli;

fn web_target_stacks(deployment: &Deployment) -> Vec<StackTemplate> {
    synthesize(
        &deployment.project,
        deployment.stage,
        DeployTarget::Web,
        &deployment.bootstrap,
    )
}

/// Deploys the web target, publishes the site and returns its URL.
pub async fn deploy(deployment: &Deployment, collaborators: &Collaborators) -> anyhow::Result<String> {
    Command::Deploy.ensure_allowed(deployment.stage)?;

    let stacks = web_target_stacks(deployment);
    tracing::info!(stage = %deployment.stage, stacks = stacks.len(), "deploying web target");
    CloudFormationCli::new(deployment, collaborators.runner.as_ref())
        .deploy(&stacks)
        .await?;

    publish(deployment, collaborators).await?;

    let domain = require_output(
        collaborators.outputs.as_ref(),
        &deployment.web_stack_name(),
        WebOutput::CloudfrontDomain.as_str(),
    )
    .await?;
    Ok(format!("https://{domain}"))
}

/// Deploys the pipeline stack alone and returns its name.
pub async fn deploy_pipeline(
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<String> {
    let stack = pipeline_only(&deployment.project, deployment.stage, &deployment.bootstrap)?;
    tracing::info!(stage = %deployment.stage, stack = %stack.stack_name, "deploying pipeline");
    CloudFormationCli::new(deployment, collaborators.runner.as_ref())
        .deploy(std::slice::from_ref(&stack))
        .await?;
    Ok(stack.stack_name)
}

/// Writes and validates the web target templates.
pub async fn synth(
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<Vec<PathBuf>> {
    let stacks = web_target_stacks(deployment);
    tracing::info!(stage = %deployment.stage, stacks = stacks.len(), "synthesizing");
    CloudFormationCli::new(deployment, collaborators.runner.as_ref())
        .synth(&stacks)
        .await
}

/// Empties the stage's buckets, then deletes its stacks newest first.
/// Returns the deleted stack names in deletion order.
pub async fn destroy(
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<Vec<String>> {
    Command::Destroy.ensure_allowed(deployment.stage)?;

    let project = &deployment.project;
    let stage = deployment.stage;
    let mut buckets = vec![project.web_bucket_name(stage)];
    // The artifacts bucket belongs to the pipeline stack, deleted only with a source repo.
    if deployment.bootstrap.source_repo().is_some() {
        buckets.push(project.artifacts_bucket_name(stage));
    }
    for bucket in &buckets {
        empty_bucket(collaborators.objects.as_ref(), bucket).await?;
    }

    let stack_names: Vec<String> = web_target_stacks(deployment)
        .into_iter()
        .map(|stack| stack.stack_name)
        .collect();
    tracing::info!(stage = %stage, stacks = stack_names.len(), "destroying");
    CloudFormationCli::new(deployment, collaborators.runner.as_ref())
        .destroy(&stack_names)
        .await?;

    Ok(stack_names.into_iter().rev().collect())
}

async fn empty_bucket(objects: &dyn ObjectStore, bucket: &str) -> anyhow::Result<()> {
    let keys = objects.list_keys(bucket).await?;
    if keys.is_empty() {
        return Ok(());
    }
    tracing::info!(bucket, objects = keys.len(), "emptying bucket");
    objects.delete_keys(bucket, &keys).await
}

#[cfg(test)]
mod tests {
    use sitestack_core::{PolicyViolation, Stage};

    use super::*;
    use crate::test_helpers::{test_deployment, write_file, Call, Fakes};

    fn with_source_repo(mut deployment: Deployment) -> Deployment {
        deployment.bootstrap.github_owner = Some("acme".to_string());
        deployment.bootstrap.github_repo = Some("site".to_string());
        deployment
    }

    fn engine_subcommands(fakes: &Fakes) -> Vec<String> {
        fakes
            .invocations()
            .into_iter()
            .filter(|invocation| invocation.program == "aws")
            .map(|invocation| invocation.args[1..3].join(" "))
            .collect()
    }

    #[tokio::test]
    async fn deploy_provisions_publishes_and_returns_url() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_file(dir.path(), "frontend/out/index.html", "<h1>hi</h1>");
        let deployment = test_deployment(dir.path(), Stage::Dev);
        let fakes = Fakes::new().with_web_stack(&deployment);

        let url = deploy(&deployment, &fakes.collaborators())
            .await
            .expect("deploy should succeed");

        assert_eq!(url, "https://d111111abcdef8.cloudfront.net");
        let programs: Vec<String> = fakes
            .invocations()
            .into_iter()
            .map(|invocation| invocation.program)
            .collect();
        assert_eq!(programs, vec!["aws", "pnpm"]);
        assert!(fakes.objects("acme-site-web-dev").contains_key("index.html"));
        let written = std::fs::read_to_string(
            dir.path()
                .join("infrastructure/cfn.out/acme-site-web-dev.template.json"),
        )
        .expect("template should be written");
        let template: serde_json::Value =
            serde_json::from_str(&written).expect("template should be valid JSON");
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(template["Resources"]["WebBucket"]["Type"], "AWS::S3::Bucket");
    }

    #[tokio::test]
    async fn deploy_passes_stack_template_and_region_to_the_engine() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_file(dir.path(), "frontend/out/index.html", "x");
        let deployment = test_deployment(dir.path(), Stage::Dev);
        let fakes = Fakes::new().with_web_stack(&deployment);

        deploy(&deployment, &fakes.collaborators())
            .await
            .expect("deploy should succeed");

        let args = fakes.invocations()[0].args.clone();
        let template = deployment
            .project
            .template_path("acme-site-web-dev")
            .display()
            .to_string();
        assert_eq!(&args[..2], ["cloudformation", "deploy"]);
        for pair in [
            ["--stack-name", "acme-site-web-dev"],
            ["--template-file", template.as_str()],
            ["--capabilities", "CAPABILITY_NAMED_IAM"],
            ["--region", "eu-west-1"],
        ] {
            assert!(
                args.windows(2).any(|window| window == pair),
                "missing {pair:?} in {args:?}"
            );
        }
    }

    #[tokio::test]
    async fn deploy_includes_pipeline_stack_when_repo_is_configured() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_file(dir.path(), "frontend/out/index.html", "x");
        let deployment = with_source_repo(test_deployment(dir.path(), Stage::Dev));
        let fakes = Fakes::new().with_web_stack(&deployment);

        deploy(&deployment, &fakes.collaborators())
            .await
            .expect("deploy should succeed");

        let stacks: Vec<String> = fakes
            .invocations()
            .into_iter()
            .filter(|invocation| invocation.program == "aws")
            .map(|invocation| invocation.args[3].clone())
            .collect();
        assert_eq!(stacks, vec!["acme-site-web-dev", "acme-site-pipeline-dev"]);
    }

    #[tokio::test]
    async fn deploy_in_prod_is_rejected_before_any_call() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = test_deployment(dir.path(), Stage::Prod);
        let fakes = Fakes::new().with_web_stack(&deployment);

        let error = deploy(&deployment, &fakes.collaborators())
            .await
            .expect_err("prod deploy should be rejected");

        assert_eq!(
            error.downcast_ref::<PolicyViolation>(),
            Some(&PolicyViolation::DirectProductionDeploy)
        );
        assert!(fakes.calls().is_empty());
    }

    #[tokio::test]
    async fn engine_failure_stops_before_publish() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = test_deployment(dir.path(), Stage::Dev);
        let fakes = Fakes::new().with_web_stack(&deployment).failing_program("aws");

        deploy(&deployment, &fakes.collaborators())
            .await
            .expect_err("engine failure should abort deploy");

        assert_eq!(fakes.invocations().len(), 1);
    }

    #[tokio::test]
    async fn deploy_pipeline_requires_source_repo() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = test_deployment(dir.path(), Stage::Dev);
        let fakes = Fakes::new();

        let error = deploy_pipeline(&deployment, &fakes.collaborators())
            .await
            .expect_err("missing repo should fail");

        assert!(error.to_string().contains("GITHUB_OWNER"));
        assert!(fakes.calls().is_empty());
    }

    #[tokio::test]
    async fn deploy_pipeline_deploys_only_the_pipeline_stack() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = with_source_repo(test_deployment(dir.path(), Stage::Prod));
        let fakes = Fakes::new();

        let stack = deploy_pipeline(&deployment, &fakes.collaborators())
            .await
            .expect("pipeline deploy should succeed");

        assert_eq!(stack, "acme-site-pipeline-prod");
        let invocations = fakes.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].args[3], "acme-site-pipeline-prod");
    }

    #[tokio::test]
    async fn synth_writes_and_validates_each_template() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = with_source_repo(test_deployment(dir.path(), Stage::Prod));
        let fakes = Fakes::new();

        let paths = synth(&deployment, &fakes.collaborators())
            .await
            .expect("synth should succeed");

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|path| path.is_file()));
        assert_eq!(
            engine_subcommands(&fakes),
            vec!["validate-template --template-body", "validate-template --template-body"]
        );
    }

    #[tokio::test]
    async fn destroy_empties_buckets_then_deletes_stacks_in_reverse() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = with_source_repo(test_deployment(dir.path(), Stage::Dev));
        let fakes = Fakes::new()
            .with_object("acme-site-web-dev", "index.html")
            .with_object("acme-site-web-dev", "404.html");

        let deleted = destroy(&deployment, &fakes.collaborators())
            .await
            .expect("destroy should succeed");

        assert_eq!(deleted, vec!["acme-site-pipeline-dev", "acme-site-web-dev"]);
        assert!(fakes.objects("acme-site-web-dev").is_empty());
        assert!(fakes.calls().contains(&Call::ListKeys("acme-site-pipeline-artifacts-dev".to_string())));
        assert!(!fakes
            .calls()
            .iter()
            .any(|call| matches!(call, Call::DeleteKeys { bucket, .. } if bucket == "acme-site-pipeline-artifacts-dev")));
        assert_eq!(
            engine_subcommands(&fakes),
            vec![
                "delete-stack --stack-name",
                "wait stack-delete-complete",
                "delete-stack --stack-name",
                "wait stack-delete-complete",
            ]
        );
    }

    #[tokio::test]
    async fn destroy_without_source_repo_leaves_pipeline_artifacts_alone() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = test_deployment(dir.path(), Stage::Dev);
        let fakes = Fakes::new()
            .with_object("acme-site-web-dev", "index.html")
            .with_object("acme-site-pipeline-artifacts-dev", "build.zip");

        let deleted = destroy(&deployment, &fakes.collaborators())
            .await
            .expect("destroy should succeed");

        assert_eq!(deleted, vec!["acme-site-web-dev"]);
        assert!(fakes.objects("acme-site-web-dev").is_empty());
        assert!(fakes
            .objects("acme-site-pipeline-artifacts-dev")
            .contains_key("build.zip"));
        assert!(!fakes
            .calls()
            .contains(&Call::ListKeys("acme-site-pipeline-artifacts-dev".to_string())));
    }

    #[tokio::test]
    async fn destroy_in_prod_is_rejected_before_any_call() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = test_deployment(dir.path(), Stage::Prod);
        let fakes = Fakes::new().with_object("acme-site-web-prod", "index.html");

        let error = destroy(&deployment, &fakes.collaborators())
            .await
            .expect_err("prod destroy should be rejected");

        assert_eq!(error.to_string(), "Production destroy not allowed");
        assert!(fakes.calls().is_empty());
    }
}
