use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;

#[async_trait]
pub trait StackOutputReader: Send + Sync {
    /// Outputs of a deployed stack, or `None` when the stack does not exist.
    async fn stack_outputs(&self, stack_name: &str)
        -> anyhow::Result<Option<BTreeMap<String, String>>>;
}

/// Fetches one named output. Outputs are read on every call, never cached.
pub async fn require_output(
    reader: &dyn StackOutputReader,
    stack_name: &str,
    output_key: &str,
) -> anyhow::Result<String> {
    let outputs = reader
        .stack_outputs(stack_name)
        .await?
        .ok_or_else(|| anyhow!("Stack {stack_name} not found"))?;

    outputs
        .get(output_key)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| anyhow!("Output {output_key} not found in {stack_name}"))
}
