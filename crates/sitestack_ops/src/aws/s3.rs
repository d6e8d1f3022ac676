use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::adapters::ObjectStore;

/// `DeleteObjects` accepts at most this many keys per request.
const DELETE_BATCH_SIZE: usize = 1000;

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                anyhow!(
                    "failed to upload s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&error)
                )
            })
    }

    async fn list_keys(&self, bucket: &str) -> anyhow::Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(error) => {
                    if error
                        .as_service_error()
                        .is_some_and(|service_error| service_error.is_no_such_bucket())
                    {
                        return Ok(Vec::new());
                    }
                    return Err(anyhow!(
                        "failed to list s3://{bucket}: {}",
                        DisplayErrorContext(&error)
                    ));
                }
            };
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );
        }

        Ok(keys)
    }

    async fn delete_keys(&self, bucket: &str, keys: &[String]) -> anyhow::Result<()> {
        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()?;

            self.client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|error| {
                    anyhow!(
                        "failed to delete objects from s3://{bucket}: {}",
                        DisplayErrorContext(&error)
                    )
                })?;
        }
        Ok(())
    }
}
