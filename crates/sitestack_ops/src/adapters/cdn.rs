use async_trait::async_trait;

#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    /// Returns the invalidation id when the service reports one.
    async fn invalidate(
        &self,
        distribution_id: &str,
        paths: &[&str],
        caller_reference: &str,
    ) -> anyhow::Result<Option<String>>;
}
