//! Static-site hosting: a private bucket served through a CloudFront
//! distribution with origin access control.

use serde_json::json;

use super::template::{get_att, reference, sub, RemovalPolicy, Resource, StackTemplate, Template};
use crate::bootstrap::BootstrapEnv;
use crate::project::ProjectConfig;
use crate::stage::Stage;

/// Managed "CachingOptimized" cache policy.
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

const BUCKET_ID: &str = "WebBucket";
const BUCKET_POLICY_ID: &str = "WebBucketPolicy";
const ORIGIN_ACCESS_CONTROL_ID: &str = "WebOriginAccessControl";
const DISTRIBUTION_ID: &str = "Distribution";
const ORIGIN_ID: &str = "WebBucketOrigin";

/// Named outputs of the web stack, read back by `publish` and `deploy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebOutput {
    CloudfrontDomain,
    CloudfrontDistributionId,
    WebBucketName,
}

impl WebOutput {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CloudfrontDomain => "CloudfrontDomain",
            Self::CloudfrontDistributionId => "CloudfrontDistributionId",
            Self::WebBucketName => "WebBucketName",
        }
    }
}

pub fn bucket_removal_policy(stage: Stage) -> RemovalPolicy {
    if stage.is_production() {
        RemovalPolicy::Retain
    } else {
        RemovalPolicy::Delete
    }
}

pub fn web_stack(project: &ProjectConfig, stage: Stage, bootstrap: &BootstrapEnv) -> StackTemplate {
    let stack_name = project.web_stack_name(stage);
    let mut template = Template::new(format!("Static site hosting for {} ({stage})", project.name));

    template.add_resource(
        BUCKET_ID,
        Resource::new(
            "AWS::S3::Bucket",
            json!({
                "BucketName": project.web_bucket_name(stage),
                "PublicAccessBlockConfiguration": {
                    "BlockPublicAcls": true,
                    "BlockPublicPolicy": true,
                    "IgnorePublicAcls": true,
                    "RestrictPublicBuckets": true,
                },
            }),
        )
        .with_removal_policy(bucket_removal_policy(stage)),
    );

    template.add_resource(
        ORIGIN_ACCESS_CONTROL_ID,
        Resource::new(
            "AWS::CloudFront::OriginAccessControl",
            json!({
                "OriginAccessControlConfig": {
                    "Name": format!("{stack_name}-oac"),
                    "OriginAccessControlOriginType": "s3",
                    "SigningBehavior": "always",
                    "SigningProtocol": "sigv4",
                },
            }),
        ),
    );

    template.add_resource(DISTRIBUTION_ID, distribution(bootstrap));

    template.add_resource(
        BUCKET_POLICY_ID,
        Resource::new(
            "AWS::S3::BucketPolicy",
            json!({
                "Bucket": reference(BUCKET_ID),
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "cloudfront.amazonaws.com" },
                        "Action": "s3:GetObject",
                        "Resource": sub(&format!("${{{BUCKET_ID}.Arn}}/*")),
                        "Condition": {
                            "StringEquals": {
                                "AWS:SourceArn": sub(&format!(
                                    "arn:aws:cloudfront::${{AWS::AccountId}}:distribution/${{{DISTRIBUTION_ID}}}"
                                )),
                            },
                        },
                    }],
                },
            }),
        ),
    );

    let prefix = project.parameter_prefix(stage);
    for (logical_id, suffix, value) in [
        (
            "SsmCloudfrontDomain",
            "cloudfront-domain",
            get_att(DISTRIBUTION_ID, "DomainName"),
        ),
        (
            "SsmCloudfrontId",
            "cloudfront-distribution-id",
            reference(DISTRIBUTION_ID),
        ),
        ("SsmBucketName", "bucket-name", reference(BUCKET_ID)),
    ] {
        template.add_resource(
            logical_id,
            Resource::new(
                "AWS::SSM::Parameter",
                json!({
                    "Name": format!("{prefix}/{suffix}"),
                    "Type": "String",
                    "Value": value,
                }),
            ),
        );
    }

    template.add_output(
        WebOutput::CloudfrontDomain.as_str(),
        get_att(DISTRIBUTION_ID, "DomainName"),
    );
    template.add_output(
        WebOutput::CloudfrontDistributionId.as_str(),
        reference(DISTRIBUTION_ID),
    );
    template.add_output(WebOutput::WebBucketName.as_str(), reference(BUCKET_ID));

    StackTemplate {
        stack_name,
        template,
    }
}

fn distribution(bootstrap: &BootstrapEnv) -> Resource {
    let mut config = json!({
        "Enabled": true,
        "HttpVersion": "http2",
        "DefaultRootObject": "index.html",
        "Origins": [{
            "Id": ORIGIN_ID,
            "DomainName": get_att(BUCKET_ID, "RegionalDomainName"),
            "OriginAccessControlId": get_att(ORIGIN_ACCESS_CONTROL_ID, "Id"),
            "S3OriginConfig": { "OriginAccessIdentity": "" },
        }],
        "DefaultCacheBehavior": {
            "TargetOriginId": ORIGIN_ID,
            "ViewerProtocolPolicy": "redirect-to-https",
            "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
            "Compress": true,
        },
        "CustomErrorResponses": [{
            "ErrorCode": 404,
            "ResponseCode": 200,
            "ResponsePagePath": "/404.html",
        }],
    });

    if let Some(domain) = bootstrap.custom_domain() {
        config["Aliases"] = json!([domain.domain_name]);
        config["ViewerCertificate"] = json!({
            "AcmCertificateArn": domain.certificate_arn,
            "SslSupportMethod": "sni-only",
            "MinimumProtocolVersion": "TLSv1.2_2021",
        });
    }

    Resource::new(
        "AWS::CloudFront::Distribution",
        json!({ "DistributionConfig": config }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bootstrap() -> BootstrapEnv {
        BootstrapEnv {
            account: "123456789012".to_string(),
            region: "eu-west-1".to_string(),
            domain_name: None,
            certificate_arn: None,
            github_owner: None,
            github_repo: None,
            github_token_secret_name: None,
        }
    }

    fn project() -> ProjectConfig {
        ProjectConfig::new("acme-site", "/work/acme")
    }

    #[test]
    fn creates_one_bucket_and_one_distribution() {
        let stack = web_stack(&project(), Stage::Dev, &bootstrap());

        assert_eq!(stack.stack_name, "acme-site-web-dev");
        assert_eq!(stack.template.resources_of_type("AWS::S3::Bucket").count(), 1);
        assert_eq!(
            stack
                .template
                .resources_of_type("AWS::CloudFront::Distribution")
                .count(),
            1
        );
    }

    #[test]
    fn bucket_is_destroyed_in_dev_and_retained_in_prod() {
        let dev = web_stack(&project(), Stage::Dev, &bootstrap());
        let prod = web_stack(&project(), Stage::Prod, &bootstrap());

        let dev_bucket = &dev.template.resources[BUCKET_ID];
        assert_eq!(dev_bucket.deletion_policy, Some(RemovalPolicy::Delete));
        assert_eq!(dev_bucket.update_replace_policy, Some(RemovalPolicy::Delete));

        let prod_bucket = &prod.template.resources[BUCKET_ID];
        assert_eq!(prod_bucket.deletion_policy, Some(RemovalPolicy::Retain));
        assert_eq!(prod_bucket.update_replace_policy, Some(RemovalPolicy::Retain));
    }

    #[test]
    fn writes_three_ssm_parameters() {
        let stack = web_stack(&project(), Stage::Dev, &bootstrap());
        let names: Vec<&str> = stack
            .template
            .resources_of_type("AWS::SSM::Parameter")
            .filter_map(|(_, resource)| resource.properties["Name"].as_str())
            .collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"/acme-site/dev/cloudfront-domain"));
        assert!(names.contains(&"/acme-site/dev/cloudfront-distribution-id"));
        assert!(names.contains(&"/acme-site/dev/bucket-name"));
    }

    #[test]
    fn exposes_outputs_read_by_publish() {
        let stack = web_stack(&project(), Stage::Dev, &bootstrap());
        for output in [
            WebOutput::CloudfrontDomain,
            WebOutput::CloudfrontDistributionId,
            WebOutput::WebBucketName,
        ] {
            assert!(stack.template.outputs.contains_key(output.as_str()));
        }
    }

    #[test]
    fn custom_domain_requires_domain_and_certificate() {
        let mut partial = bootstrap();
        partial.domain_name = Some("www.example.com".to_string());
        let stack = web_stack(&project(), Stage::Prod, &partial);
        let config = &stack.template.resources[DISTRIBUTION_ID].properties["DistributionConfig"];
        assert!(config.get("Aliases").is_none());

        let mut full = partial.clone();
        full.certificate_arn = Some("arn:aws:acm:us-east-1:123456789012:certificate/abc".to_string());
        let stack = web_stack(&project(), Stage::Prod, &full);
        let config = &stack.template.resources[DISTRIBUTION_ID].properties["DistributionConfig"];
        assert_eq!(config["Aliases"], json!(["www.example.com"]));
        assert_eq!(
            config["ViewerCertificate"]["AcmCertificateArn"],
            "arn:aws:acm:us-east-1:123456789012:certificate/abc"
        );
        assert_eq!(config["ViewerCertificate"]["SslSupportMethod"], "sni-only");
    }

    #[test]
    fn bucket_policy_is_scoped_to_the_distribution() {
        let stack = web_stack(&project(), Stage::Dev, &bootstrap());
        let statement =
            &stack.template.resources[BUCKET_POLICY_ID].properties["PolicyDocument"]["Statement"][0];

        assert_eq!(statement["Principal"]["Service"], "cloudfront.amazonaws.com");
        assert_eq!(
            statement["Condition"]["StringEquals"]["AWS:SourceArn"]["Fn::Sub"],
            "arn:aws:cloudfront::${AWS::AccountId}:distribution/${Distribution}"
        );
    }
}
