use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::operation::create_open_id_connect_provider::CreateOpenIdConnectProviderOutput;

use crate::adapters::IdentityProviderRegistry;

pub struct IamIdentityProviders {
    client: aws_sdk_iam::Client,
}

impl IamIdentityProviders {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityProviderRegistry for IamIdentityProviders {
    async fn list_provider_arns(&self) -> anyhow::Result<Vec<String>> {
        let output = self
            .client
            .list_open_id_connect_providers()
            .send()
            .await
            .map_err(|error| {
                anyhow!(
                    "failed to list OIDC providers: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        Ok(output
            .open_id_connect_provider_list()
            .iter()
            .filter_map(|entry| entry.arn())
            .map(str::to_string)
            .collect())
    }

    async fn create_provider(
        &self,
        url: &str,
        client_ids: &[&str],
        thumbprints: &[&str],
    ) -> anyhow::Result<String> {
        let output = self
            .client
            .create_open_id_connect_provider()
            .url(url)
            .set_client_id_list(Some(client_ids.iter().map(|id| id.to_string()).collect()))
            .set_thumbprint_list(Some(
                thumbprints.iter().map(|print| print.to_string()).collect(),
            ))
            .send()
            .await
            .map_err(|error| {
                anyhow!(
                    "failed to create OIDC provider {url}: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        created_provider_arn(&output, url)
    }
}

fn created_provider_arn(
    output: &CreateOpenIdConnectProviderOutput,
    url: &str,
) -> anyhow::Result<String> {
    output
        .open_id_connect_provider_arn()
        .filter(|arn| !arn.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("IAM returned no ARN for the created OIDC provider {url}"))
}
