use async_trait::async_trait;

#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Writes a plain string parameter, overwriting any existing value.
    async fn put_string(&self, name: &str, value: &str) -> anyhow::Result<()>;
}
