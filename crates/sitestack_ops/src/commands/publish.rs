use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use sitestack_core::content_type::content_type_for;
use sitestack_core::stacks::WebOutput;

use crate::adapters::{require_output, Invocation};
use crate::context::{Collaborators, Deployment};

pub const SITE_BUILDER: &str = "pnpm";
pub const SITE_BUILD_ARGS: [&str; 4] = ["--filter", "frontend", "run", "build"];
pub const INVALIDATION_PATHS: [&str; 1] = ["/*"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub bucket: String,
    pub uploaded_keys: Vec<String>,
    pub distribution_id: String,
    pub invalidation_id: Option<String>,
    pub caller_reference: String,
}

/// A built site file and the object key it is uploaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    pub path: PathBuf,
    pub key: String,
}

/// Builds the site, uploads every output file and invalidates the CDN.
///
/// Stack outputs are read fresh on each run. Re-running overwrites the same
/// keys and issues a new invalidation.
pub async fn publish(
    deployment: &Deployment,
    collaborators: &Collaborators,
) -> anyhow::Result<PublishReport> {
    let project = &deployment.project;
    let stack_name = deployment.web_stack_name();

    tracing::info!("building site");
    collaborators
        .runner
        .run(&Invocation::new(SITE_BUILDER, SITE_BUILD_ARGS, &project.root))
        .await
        .context("site build failed")?;

    let bucket = require_output(
        collaborators.outputs.as_ref(),
        &stack_name,
        WebOutput::WebBucketName.as_str(),
    )
    .await?;

    let files = collect_site_files(&project.site_out_dir())?;
    tracing::info!(bucket = %bucket, files = files.len(), "uploading site");

    let mut uploaded_keys = Vec::with_capacity(files.len());
    for file in files {
        let body = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("failed to read {}", file.path.display()))?;
        let content_type = content_type_for(&file.path);
        tracing::debug!(key = %file.key, content_type, "uploading");
        collaborators
            .objects
            .put_object(&bucket, &file.key, body, content_type)
            .await?;
        uploaded_keys.push(file.key);
    }

    let distribution_id = require_output(
        collaborators.outputs.as_ref(),
        &stack_name,
        WebOutput::CloudfrontDistributionId.as_str(),
    )
    .await?;

    let caller_reference = caller_reference();
    tracing::info!(distribution = %distribution_id, "invalidating cache");
    let invalidation_id = collaborators
        .cdn
        .invalidate(&distribution_id, &INVALIDATION_PATHS, &caller_reference)
        .await?;

    Ok(PublishReport {
        bucket,
        uploaded_keys,
        distribution_id,
        invalidation_id,
        caller_reference,
    })
}

/// Current time in milliseconds; unique per invalidation request.
pub fn caller_reference() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Every regular file below `root`, sorted by key.
pub fn collect_site_files(root: &Path) -> anyhow::Result<Vec<SiteFile>> {
    if !root.is_dir() {
        bail!(
            "Site output directory {} not found; did the site build run?",
            root.display()
        );
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
            let file_type = entry
                .file_type()
                .with_context(|| format!("failed to stat {}", entry.path().display()))?;
            let path = entry.path();
            // Symlinked directories are not followed; linked files are uploaded.
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                let key = object_key(root, &path)?;
                files.push(SiteFile { path, key });
            }
        }
    }

    files.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(files)
}

fn object_key(root: &Path, path: &Path) -> anyhow::Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    Ok(relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
