use async_trait::async_trait;

#[async_trait]
pub trait IdentityProviderRegistry: Send + Sync {
    async fn list_provider_arns(&self) -> anyhow::Result<Vec<String>>;

    /// Returns the ARN of the created provider.
    async fn create_provider(
        &self,
        url: &str,
        client_ids: &[&str],
        thumbprints: &[&str],
    ) -> anyhow::Result<String>;
}
