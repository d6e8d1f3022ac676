use async_trait::async_trait;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<()>;

    /// Keys currently stored in `bucket`; a bucket that does not exist is empty.
    async fn list_keys(&self, bucket: &str) -> anyhow::Result<Vec<String>>;

    async fn delete_keys(&self, bucket: &str, keys: &[String]) -> anyhow::Result<()>;
}
