use crate::adapters::Invocation;
use crate::context::{Collaborators, Deployment};

pub const SOURCE_CONTROL_CLI: &str = "gh";

/// Repository variables the CI workflows read, in the order they are set.
pub fn repository_variables(deployment: &Deployment) -> [(&'static str, &str); 3] {
    [
        ("PROJECT_NAME", deployment.project.name.as_str()),
        ("AWS_ACCOUNT_ID", deployment.bootstrap.account.as_str()),
        ("AWS_REGION_DEFAULT", deployment.bootstrap.region.as_str()),
    ]
}

/// Sets the CI repository variables through `gh`, then lists them.
pub async fn github_vars(
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<()> {
    let root = &deployment.project.root;
    for (name, value) in repository_variables(deployment) {
        tracing::info!(variable = name, "setting repository variable");
        collaborators
            .runner
            .run(&Invocation::new(
                SOURCE_CONTROL_CLI,
                ["variable", "set", name, "--body", value],
                root,
            ))
            .await?;
    }
    collaborators
        .runner
        .run(&Invocation::new(SOURCE_CONTROL_CLI, ["variable", "list"], root))
        .await
}
