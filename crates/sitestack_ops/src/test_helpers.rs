//! Recording fakes for every external seam.
//!
//! One `Fakes` value implements all adapter traits over shared state, so a
//! test can hand out collaborators and afterwards inspect every call in the
//! order it was issued.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use sitestack_core::{BootstrapEnv, ProjectConfig, Stage};

use crate::adapters::{
    CdnInvalidator, CommandRunner, IdentityProviderRegistry, Invocation, ObjectStore,
    ParameterStore, StackOutputReader,
};
use crate::context::{Collaborators, Deployment};

pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_REGION: &str = "eu-west-1";
pub const TEST_PROJECT: &str = "acme-site";

/// One observed external call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Run(Invocation),
    PutObject {
        bucket: String,
        key: String,
        content_type: String,
    },
    ListKeys(String),
    DeleteKeys {
        bucket: String,
        keys: Vec<String>,
    },
    Invalidate {
        distribution_id: String,
        paths: Vec<String>,
        caller_reference: String,
    },
    StackOutputs(String),
    PutParameter {
        name: String,
        value: String,
    },
    ListProviders,
    CreateProvider {
        url: String,
        client_ids: Vec<String>,
        thumbprints: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<Call>,
    stack_outputs: BTreeMap<String, BTreeMap<String, String>>,
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    provider_arns: Vec<String>,
    failing_programs: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Fakes {
    state: Arc<Mutex<FakeState>>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deployed stack with the given outputs.
    pub fn with_stack_outputs(self, stack_name: &str, outputs: &[(&str, &str)]) -> Self {
        self.lock().stack_outputs.insert(
            stack_name.to_string(),
            outputs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        );
        self
    }

    /// Registers the standard web stack outputs for `deployment`.
    pub fn with_web_stack(self, deployment: &Deployment) -> Self {
        let bucket = deployment.project.web_bucket_name(deployment.stage);
        self.with_stack_outputs(
            &deployment.web_stack_name(),
            &[
                ("CloudfrontDomain", "d111111abcdef8.cloudfront.net"),
                ("CloudfrontDistributionId", "E2EXAMPLE"),
                ("WebBucketName", bucket.as_str()),
            ],
        )
    }

    pub fn with_object(self, bucket: &str, key: &str) -> Self {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    body: Vec::new(),
                    content_type: "text/plain".to_string(),
                },
            );
        self
    }

    pub fn with_provider(self, arn: &str) -> Self {
        self.lock().provider_arns.push(arn.to_string());
        self
    }

    /// Makes every run of `program` exit nonzero.
    pub fn failing_program(self, program: &str) -> Self {
        self.lock().failing_programs.push(program.to_string());
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            runner: Box::new(self.clone()),
            objects: Box::new(self.clone()),
            cdn: Box::new(self.clone()),
            outputs: Box::new(self.clone()),
            parameters: Box::new(self.clone()),
            identity: Box::new(self.clone()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Run(invocation) => Some(invocation),
                _ => None,
            })
            .collect()
    }

    pub fn parameter_writes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PutParameter { name, value } => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    pub fn objects(&self, bucket: &str) -> BTreeMap<String, StoredObject> {
        self.lock().buckets.get(bucket).cloned().unwrap_or_default()
    }

    pub fn provider_arns(&self) -> Vec<String> {
        self.lock().provider_arns.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock should not be poisoned")
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl CommandRunner for Fakes {
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<()> {
        self.record(Call::Run(invocation.clone()));
        if self.lock().failing_programs.contains(&invocation.program) {
            return Err(anyhow!("{} exited with 1", invocation.program));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for Fakes {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<()> {
        self.record(Call::PutObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
        });
        self.lock().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn list_keys(&self, bucket: &str) -> anyhow::Result<Vec<String>> {
        self.record(Call::ListKeys(bucket.to_string()));
        Ok(self
            .lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_keys(&self, bucket: &str, keys: &[String]) -> anyhow::Result<()> {
        self.record(Call::DeleteKeys {
            bucket: bucket.to_string(),
            keys: keys.to_vec(),
        });
        if let Some(objects) = self.lock().buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CdnInvalidator for Fakes {
    async fn invalidate(
        &self,
        distribution_id: &str,
        paths: &[&str],
        caller_reference: &str,
    ) -> anyhow::Result<Option<String>> {
        self.record(Call::Invalidate {
            distribution_id: distribution_id.to_string(),
            paths: paths.iter().map(|path| path.to_string()).collect(),
            caller_reference: caller_reference.to_string(),
        });
        Ok(Some(format!("I{caller_reference}")))
    }
}

#[async_trait]
impl StackOutputReader for Fakes {
    async fn stack_outputs(
        &self,
        stack_name: &str,
    ) -> anyhow::Result<Option<BTreeMap<String, String>>> {
        self.record(Call::StackOutputs(stack_name.to_string()));
        Ok(self.lock().stack_outputs.get(stack_name).cloned())
    }
}

#[async_trait]
impl ParameterStore for Fakes {
    async fn put_string(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.record(Call::PutParameter {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl IdentityProviderRegistry for Fakes {
    async fn list_provider_arns(&self) -> anyhow::Result<Vec<String>> {
        self.record(Call::ListProviders);
        Ok(self.provider_arns())
    }

    async fn create_provider(
        &self,
        url: &str,
        client_ids: &[&str],
        thumbprints: &[&str],
    ) -> anyhow::Result<String> {
        self.record(Call::CreateProvider {
            url: url.to_string(),
            client_ids: client_ids.iter().map(|id| id.to_string()).collect(),
            thumbprints: thumbprints.iter().map(|t| t.to_string()).collect(),
        });
        let host = url.trim_start_matches("https://");
        let arn = format!("arn:aws:iam::{TEST_ACCOUNT}:oidc-provider/{host}");
        self.lock().provider_arns.push(arn.clone());
        Ok(arn)
    }
}

/// Minimal valid bootstrap values: account and region only.
pub fn test_bootstrap() -> BootstrapEnv {
    BootstrapEnv {
        account: TEST_ACCOUNT.to_string(),
        region: TEST_REGION.to_string(),
        domain_name: None,
        certificate_arn: None,
        github_owner: None,
        github_repo: None,
        github_token_secret_name: None,
    }
}

/// A deployment rooted at `root`, bypassing the production policy and the
/// bootstrap file so tests can exercise command bodies directly.
pub fn test_deployment(root: &Path, stage: Stage) -> Deployment {
    Deployment {
        project: ProjectConfig::new(TEST_PROJECT, root),
        stage,
        bootstrap: test_bootstrap(),
    }
}

/// Writes `contents` to `relative` below `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("parent directory should be created");
    }
    std::fs::write(&path, contents).expect("file should be written");
}
