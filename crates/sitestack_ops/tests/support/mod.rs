#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use sitestack_core::{Command, ProjectConfig, Stage};
use sitestack_ops::test_helpers::{write_file, TEST_PROJECT};
use sitestack_ops::Deployment;
use tempfile::TempDir;

pub const DEV_ENV_FILE: &str = "\
CDK_DEFAULT_ACCOUNT=123456789012
CDK_DEFAULT_REGION=eu-west-1
";

/// A project directory with a dev env file and a two-page built site.
pub fn seeded_project() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_file(dir.path(), "infrastructure/.env.dev", DEV_ENV_FILE);
    write_file(dir.path(), "frontend/out/index.html", "<h1>home</h1>");
    write_file(dir.path(), "frontend/out/404.html", "<h1>missing</h1>");
    dir
}

pub fn project(root: &Path) -> ProjectConfig {
    ProjectConfig::new(TEST_PROJECT, root)
}

/// Prepares a deployment the way the binary does, with an empty process
/// environment.
pub fn prepare(root: &Path, stage: Stage, command: Command) -> anyhow::Result<Deployment> {
    Deployment::prepare(project(root), stage, command, &BTreeMap::new())
}
