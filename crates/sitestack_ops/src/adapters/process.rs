use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use async_trait::async_trait;

/// One external program run: the provisioning engine, the site builder or
/// the source-control CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs to completion with inherited stdio; a nonzero exit is an error.
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<()> {
        tracing::debug!(cwd = %invocation.cwd.display(), "+ {invocation}");
        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .await
            .with_context(|| format!("failed to execute {}", invocation.program))?;

        if status.success() {
            Ok(())
        } else {
            Err(match status.code() {
                Some(code) => anyhow!("{} exited with {code}", invocation.program),
                None => anyhow!("{} was terminated by a signal", invocation.program),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_program_and_arguments() {
        let invocation = Invocation::new("gh", ["variable", "list"], Path::new("."));
        assert_eq!(invocation.to_string(), "gh variable list");
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let invocation = Invocation::new("sh", ["-c", "exit 3"], dir.path());

        let error = SystemCommandRunner
            .run(&invocation)
            .await
            .expect_err("exit 3 should fail");
        assert_eq!(error.to_string(), "sh exited with 3");
    }

    #[tokio::test]
    async fn zero_exit_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        SystemCommandRunner
            .run(&Invocation::new("sh", ["-c", "true"], dir.path()))
            .await
            .expect("true should succeed");
    }
}
