use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};

use crate::adapters::CdnInvalidator;

pub struct CloudFrontInvalidator {
    client: aws_sdk_cloudfront::Client,
}

impl CloudFrontInvalidator {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudfront::Client::new(config),
        }
    }
}

#[async_trait]
impl CdnInvalidator for CloudFrontInvalidator {
    async fn invalidate(
        &self,
        distribution_id: &str,
        paths: &[&str],
        caller_reference: &str,
    ) -> anyhow::Result<Option<String>> {
        let quantity = i32::try_from(paths.len())?;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(paths.iter().map(|path| path.to_string()).collect()))
            .build()?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|error| {
                anyhow!(
                    "failed to invalidate distribution {distribution_id}: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        Ok(output
            .invalidation()
            .map(|invalidation| invalidation.id().to_string()))
    }
}
