use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// What happens to a resource when its stack is deleted or it is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    Retain,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

impl Resource {
    pub fn new(resource_type: &str, properties: Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "Value")]
    pub value: Value,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: Some(description.into()),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn add_resource(&mut self, logical_id: &str, resource: Resource) {
        self.resources.insert(logical_id.to_string(), resource);
    }

    pub fn add_output(&mut self, name: &str, value: Value) {
        self.outputs.insert(
            name.to_string(),
            Output {
                value,
                description: None,
            },
        );
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.resource_type == resource_type)
    }
}

/// A named stack and the template the provisioning engine converges it to.
#[derive(Debug, Clone, PartialEq)]
pub struct StackTemplate {
    pub stack_name: String,
    pub template: Template,
}

impl StackTemplate {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.template)
    }
}

pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

pub fn sub(pattern: &str) -> Value {
    json!({ "Fn::Sub": pattern })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_cloudformation_field_names() {
        let mut template = Template::new("example");
        template.add_resource(
            "Bucket",
            Resource::new("AWS::S3::Bucket", json!({ "BucketName": "b" }))
                .with_removal_policy(RemovalPolicy::Retain),
        );
        template.add_output("BucketName", reference("Bucket"));

        let value = serde_json::to_value(&template).expect("template should serialize");
        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Resources"]["Bucket"]["Type"], "AWS::S3::Bucket");
        assert_eq!(value["Resources"]["Bucket"]["DeletionPolicy"], "Retain");
        assert_eq!(value["Resources"]["Bucket"]["UpdateReplacePolicy"], "Retain");
        assert_eq!(value["Outputs"]["BucketName"]["Value"]["Ref"], "Bucket");
    }

    #[test]
    fn omits_unset_policies_and_empty_outputs() {
        let mut template = Template::new("example");
        template.add_resource("Param", Resource::new("AWS::SSM::Parameter", json!({})));

        let value = serde_json::to_value(&template).expect("template should serialize");
        assert!(value["Resources"]["Param"].get("DeletionPolicy").is_none());
        assert!(value.get("Outputs").is_none());
    }
}
