use std::fmt;

use sitestack_core::stacks::pipeline::{GITHUB_OIDC_HOST, STS_AUDIENCE};

use crate::context::Collaborators;

pub const GITHUB_OIDC_THUMBPRINT: &str = "1c58a3a8518e8759bf075b76b750d4f2df264fcd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OidcOutcome {
    AlreadyExists(String),
    Created(String),
}

impl fmt::Display for OidcOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists(arn) => write!(f, "GitHub OIDC provider already exists: {arn}"),
            Self::Created(arn) => write!(f, "Created GitHub OIDC provider: {arn}"),
        }
    }
}

/// Ensures the account trusts GitHub Actions tokens. Idempotent.
pub async fn setup_oidc(collaborators: &Collaborators) -> anyhow::Result<OidcOutcome> {
    let existing = collaborators
        .identity
        .list_provider_arns()
        .await?
        .into_iter()
        .find(|arn| arn.contains(GITHUB_OIDC_HOST));
    if let Some(arn) = existing {
        tracing::info!(provider = %arn, "GitHub OIDC provider present");
        return Ok(OidcOutcome::AlreadyExists(arn));
    }

    tracing::info!("creating GitHub OIDC provider");
    let url = format!("https://{GITHUB_OIDC_HOST}");
    let arn = collaborators
        .identity
        .create_provider(&url, &[STS_AUDIENCE], &[GITHUB_OIDC_THUMBPRINT])
        .await?;
    Ok(OidcOutcome::Created(arn))
}
