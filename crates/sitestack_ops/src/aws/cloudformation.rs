use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::error::DisplayErrorContext;

use crate::adapters::StackOutputReader;

pub struct CloudFormationOutputs {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationOutputs {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudformation::Client::new(config),
        }
    }
}

#[async_trait]
impl StackOutputReader for CloudFormationOutputs {
    async fn stack_outputs(
        &self,
        stack_name: &str,
    ) -> anyhow::Result<Option<BTreeMap<String, String>>> {
        let response = match self.client.describe_stacks().stack_name(stack_name).send().await {
            Ok(response) => response,
            Err(error) => {
                let rendered = DisplayErrorContext(&error).to_string();
                // A missing stack is reported as a generic validation error.
                if rendered.contains("does not exist") {
                    return Ok(None);
                }
                return Err(anyhow!("failed to describe stack {stack_name}: {rendered}"));
            }
        };

        let Some(stack) = response.stacks().first() else {
            return Ok(None);
        };

        let outputs = stack
            .outputs()
            .iter()
            .filter_map(|output| match (output.output_key(), output.output_value()) {
                (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
                _ => None,
            })
            .collect();
        Ok(Some(outputs))
    }
}
