use anyhow::Context;
use sitestack_core::params::parse_param_file;

use crate::context::{Collaborators, Deployment};

/// Copies every `KEY=value` line of the stage env file into the parameter
/// store under `/<project>/<stage>/stack/<KEY>`. Returns the written names.
pub async fn ssm_upload(
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<Vec<String>> {
    let project = &deployment.project;
    let path = project.env_file(deployment.stage);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let entries = parse_param_file(&contents);
    tracing::info!(file = %path.display(), parameters = entries.len(), "uploading parameters");

    let mut names = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = project.stack_parameter_name(deployment.stage, &entry.key);
        tracing::debug!(parameter = %name, "put");
        collaborators.parameters.put_string(&name, &entry.value).await?;
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use sitestack_core::Stage;

    use super::*;
    use crate::test_helpers::{test_deployment, write_file, Fakes};

    #[tokio::test]
    async fn uploads_uppercase_keys_only() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_file(
            dir.path(),
            "infrastructure/.env.dev",
            "# comment\nCDK_DEFAULT_REGION=eu-west-1\nfoo=bar\n\nAPI_URL=https://api.example.com?a=b\nEMPTY=\n",
        );
        let deployment = test_deployment(dir.path(), Stage::Dev);
        let fakes = Fakes::new();

        let names = ssm_upload(&deployment, &fakes.collaborators())
            .await
            .expect("upload should succeed");

        assert_eq!(
            names,
            vec![
                "/acme-site/dev/stack/CDK_DEFAULT_REGION",
                "/acme-site/dev/stack/API_URL",
            ]
        );
        assert_eq!(
            fakes.parameter_writes(),
            vec![
                (
                    "/acme-site/dev/stack/CDK_DEFAULT_REGION".to_string(),
                    "eu-west-1".to_string()
                ),
                (
                    "/acme-site/dev/stack/API_URL".to_string(),
                    "https://api.example.com?a=b".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let deployment = test_deployment(dir.path(), Stage::Prod);
        let fakes = Fakes::new();

        let error = ssm_upload(&deployment, &fakes.collaborators())
            .await
            .expect_err("missing file should fail");

        assert!(error.to_string().contains(".env.prod"));
        assert!(fakes.calls().is_empty());
    }
}
