//! CI/CD pipeline: GitHub source, CodeBuild deploy, and a role GitHub
//! Actions assumes through the account's OIDC provider to start it.

use serde_json::json;

use super::template::{get_att, reference, sub, RemovalPolicy, Resource, StackTemplate, Template};
use crate::bootstrap::{BootstrapEnv, SourceRepo, ACCOUNT_KEY, REGION_KEY};
use crate::project::ProjectConfig;
use crate::stage::{Stage, STAGE_ENV_VAR};

pub const GITHUB_OIDC_HOST: &str = "token.actions.githubusercontent.com";
pub const STS_AUDIENCE: &str = "sts.amazonaws.com";
pub const BUILD_IMAGE: &str = "aws/codebuild/standard:7.0";
pub const GITHUB_ACTIONS_ROLE_OUTPUT: &str = "GitHubActionsRoleArn";

const GITHUB_ROLE_ID: &str = "GitHubActionsRole";
const ARTIFACTS_BUCKET_ID: &str = "ArtifactsBucket";
const BUILD_ROLE_ID: &str = "CodeBuildRole";
const BUILD_PROJECT_ID: &str = "BuildProject";
const PIPELINE_ROLE_ID: &str = "PipelineRole";
const PIPELINE_ID: &str = "Pipeline";

const CODEBUILD_IAM_ACTIONS: &[&str] = &[
    "iam:CreateRole",
    "iam:DeleteRole",
    "iam:AttachRolePolicy",
    "iam:DetachRolePolicy",
    "iam:PutRolePolicy",
    "iam:DeleteRolePolicy",
    "iam:GetRole",
    "iam:PassRole",
    "iam:TagRole",
    "iam:UntagRole",
    "iam:ListRolePolicies",
    "iam:ListAttachedRolePolicies",
];

pub fn pipeline_stack(
    project: &ProjectConfig,
    stage: Stage,
    bootstrap: &BootstrapEnv,
    source: SourceRepo<'_>,
) -> StackTemplate {
    let stack_name = project.pipeline_stack_name(stage);
    let pipeline_name = stack_name.clone();
    let mut template = Template::new(format!(
        "Deployment pipeline for {} ({stage})",
        project.name
    ));

    template.add_resource(
        GITHUB_ROLE_ID,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "RoleName": project.github_actions_role_name(stage),
                "MaxSessionDuration": 3600,
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": {
                            "Federated": sub(&format!(
                                "arn:aws:iam::${{AWS::AccountId}}:oidc-provider/{GITHUB_OIDC_HOST}"
                            )),
                        },
                        "Action": "sts:AssumeRoleWithWebIdentity",
                        "Condition": {
                            "StringEquals": { format!("{GITHUB_OIDC_HOST}:aud"): STS_AUDIENCE },
                            "StringLike": {
                                format!("{GITHUB_OIDC_HOST}:sub"):
                                    format!("repo:{}/{}:*", source.owner, source.repo),
                            },
                        },
                    }],
                },
                "Policies": [{
                    "PolicyName": "StartPipeline",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": "codepipeline:StartPipelineExecution",
                            "Resource": sub(&format!(
                                "arn:aws:codepipeline:${{AWS::Region}}:${{AWS::AccountId}}:{pipeline_name}"
                            )),
                        }],
                    },
                }],
            }),
        ),
    );

    template.add_resource(
        ARTIFACTS_BUCKET_ID,
        Resource::new(
            "AWS::S3::Bucket",
            json!({ "BucketName": project.artifacts_bucket_name(stage) }),
        )
        .with_removal_policy(RemovalPolicy::Delete),
    );

    template.add_resource(
        BUILD_ROLE_ID,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": service_trust("codebuild.amazonaws.com"),
                "ManagedPolicyArns": ["arn:aws:iam::aws:policy/PowerUserAccess"],
                "Policies": [{
                    "PolicyName": "IAMPermissions",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": CODEBUILD_IAM_ACTIONS,
                            "Resource": sub(&format!(
                                "arn:aws:iam::${{AWS::AccountId}}:role/{}-*",
                                project.name
                            )),
                        }],
                    },
                }],
            }),
        ),
    );

    template.add_resource(
        BUILD_PROJECT_ID,
        Resource::new(
            "AWS::CodeBuild::Project",
            json!({
                "Name": project.build_project_name(stage),
                "ServiceRole": get_att(BUILD_ROLE_ID, "Arn"),
                "Source": { "Type": "CODEPIPELINE", "BuildSpec": "buildspec.yml" },
                "Artifacts": { "Type": "CODEPIPELINE" },
                "Environment": {
                    "Type": "LINUX_CONTAINER",
                    "Image": BUILD_IMAGE,
                    "ComputeType": "BUILD_GENERAL1_SMALL",
                    "EnvironmentVariables": [
                        { "Name": STAGE_ENV_VAR, "Type": "PLAINTEXT", "Value": stage.as_str() },
                        { "Name": "PROJECT_NAME", "Type": "PLAINTEXT", "Value": project.name },
                        { "Name": ACCOUNT_KEY, "Type": "PLAINTEXT", "Value": bootstrap.account },
                        { "Name": REGION_KEY, "Type": "PLAINTEXT", "Value": bootstrap.region },
                    ],
                },
            }),
        ),
    );

    template.add_resource(
        PIPELINE_ROLE_ID,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": service_trust("codepipeline.amazonaws.com"),
                "Policies": [{
                    "PolicyName": "PipelineExecution",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [
                            {
                                "Effect": "Allow",
                                "Action": ["s3:GetObject", "s3:GetObjectVersion", "s3:PutObject", "s3:GetBucketVersioning"],
                                "Resource": [
                                    get_att(ARTIFACTS_BUCKET_ID, "Arn"),
                                    sub(&format!("${{{ARTIFACTS_BUCKET_ID}.Arn}}/*")),
                                ],
                            },
                            {
                                "Effect": "Allow",
                                "Action": ["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
                                "Resource": get_att(BUILD_PROJECT_ID, "Arn"),
                            },
                        ],
                    },
                }],
            }),
        ),
    );

    let token_secret = bootstrap
        .github_token_secret_name
        .clone()
        .unwrap_or_else(|| project.default_token_secret_name());

    template.add_resource(
        PIPELINE_ID,
        Resource::new(
            "AWS::CodePipeline::Pipeline",
            json!({
                "Name": pipeline_name,
                "RoleArn": get_att(PIPELINE_ROLE_ID, "Arn"),
                "ArtifactStore": { "Type": "S3", "Location": reference(ARTIFACTS_BUCKET_ID) },
                "Stages": [
                    {
                        "Name": "Source",
                        "Actions": [{
                            "Name": "GitHub",
                            "ActionTypeId": {
                                "Category": "Source",
                                "Owner": "ThirdParty",
                                "Provider": "GitHub",
                                "Version": "1",
                            },
                            "Configuration": {
                                "Owner": source.owner,
                                "Repo": source.repo,
                                "Branch": stage.source_branch(),
                                "OAuthToken": format!("{{{{resolve:secretsmanager:{token_secret}}}}}"),
                                "PollForSourceChanges": false,
                            },
                            "OutputArtifacts": [{ "Name": "Source" }],
                        }],
                    },
                    {
                        "Name": "Build",
                        "Actions": [{
                            "Name": "Deploy",
                            "ActionTypeId": {
                                "Category": "Build",
                                "Owner": "AWS",
                                "Provider": "CodeBuild",
                                "Version": "1",
                            },
                            "Configuration": { "ProjectName": reference(BUILD_PROJECT_ID) },
                            "InputArtifacts": [{ "Name": "Source" }],
                            "OutputArtifacts": [{ "Name": "Build" }],
                        }],
                    },
                ],
            }),
        ),
    );

    template.add_output(GITHUB_ACTIONS_ROLE_OUTPUT, get_att(GITHUB_ROLE_ID, "Arn"));

    StackTemplate {
        stack_name,
        template,
    }
}

fn service_trust(service: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole",
        }],
    })
}
