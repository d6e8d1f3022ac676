//! AWS SDK implementations of the adapter traits.

pub mod cloudformation;
pub mod cloudfront;
pub mod iam;
pub mod s3;
pub mod ssm;

use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::adapters::SystemCommandRunner;
use crate::context::Collaborators;

pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Collaborators backed by real AWS clients and system processes.
pub fn collaborators(config: &SdkConfig) -> Collaborators {
    Collaborators {
        runner: Box::new(SystemCommandRunner),
        objects: Box::new(s3::S3ObjectStore::new(config)),
        cdn: Box::new(cloudfront::CloudFrontInvalidator::new(config)),
        outputs: Box::new(cloudformation::CloudFormationOutputs::new(config)),
        parameters: Box::new(ssm::SsmParameterStore::new(config)),
        identity: Box::new(iam::IamIdentityProviders::new(config)),
    }
}
