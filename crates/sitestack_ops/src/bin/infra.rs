use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sitestack_core::bootstrap::process_environment;
use sitestack_core::project::DEFAULT_PROJECT_NAME;
use sitestack_core::{Command, ProjectConfig, Stage};
use sitestack_ops::{aws, execute, Deployment};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "infra",
    about = "Deploy and operate the static site stacks",
    long_about = "Deploys, publishes and tears down the static site stacks.\n\
                  The stage comes from ENVIRONMENT (dev or prod); bootstrap values come\n\
                  from infrastructure/.env.<stage> overlaid by the process environment."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root containing infrastructure/ and frontend/
    #[arg(long, env = "PROJECT_ROOT", default_value = ".", global = true)]
    project_root: PathBuf,

    /// Project name used to derive stack, bucket and parameter names
    #[arg(long, env = "PROJECT_NAME", default_value = DEFAULT_PROJECT_NAME, global = true)]
    project_name: String,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Words after the command name. Accepted and ignored.
#[derive(Args)]
struct Trailing {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    _rest: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the web stack (and pipeline stack when configured), then publish
    Deploy(Trailing),
    /// Deploy only the pipeline stack
    #[command(alias = "deploy:pipeline")]
    DeployPipeline(Trailing),
    /// Build the site, upload it and invalidate the CDN cache
    Publish(Trailing),
    /// Copy KEY=value lines of the stage env file into the parameter store
    SsmUpload(Trailing),
    /// Set the CI repository variables through gh
    GithubVars(Trailing),
    /// Ensure the GitHub Actions OIDC provider exists
    SetupOidc(Trailing),
    /// Write and validate stack templates
    Synth(Trailing),
    /// Empty buckets and delete the stage's stacks
    Destroy(Trailing),
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Deploy(_) => Command::Deploy,
            Commands::DeployPipeline(_) => Command::DeployPipeline,
            Commands::Publish(_) => Command::Publish,
            Commands::SsmUpload(_) => Command::SsmUpload,
            Commands::GithubVars(_) => Command::GithubVars,
            Commands::SetupOidc(_) => Command::SetupOidc,
            Commands::Synth(_) => Command::Synth,
            Commands::Destroy(_) => Command::Destroy,
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = Command::from(cli.command);
    let stage = Stage::from_env()?;
    command.ensure_allowed(stage)?;
    let root = std::fs::canonicalize(&cli.project_root)
        .with_context(|| format!("project root {} not found", cli.project_root.display()))?;
    let project = ProjectConfig::new(cli.project_name, root);

    let deployment = Deployment::prepare(project, stage, command, &process_environment())?;
    let sdk_config = aws::load_sdk_config(&deployment.bootstrap.region).await;
    let collaborators = aws::collaborators(&sdk_config);

    let outcome = execute(command, &deployment, &collaborators).await?;
    println!("{outcome}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(args).map(|cli| Command::from(cli.command))
    }

    #[test]
    fn accepts_every_command_name() {
        for command in Command::ALL {
            let parsed = parse(&["infra", command.name()]).expect("command should parse");
            assert_eq!(parsed, command);
        }
    }

    #[test]
    fn accepts_colon_alias_for_pipeline_deploy() {
        let parsed = parse(&["infra", "deploy:pipeline"]).expect("alias should parse");
        assert_eq!(parsed, Command::DeployPipeline);
    }

    #[test]
    fn ignores_arguments_after_the_command() {
        assert_eq!(
            parse(&["infra", "deploy", "now"]).expect("extra words should be ignored"),
            Command::Deploy
        );
        assert_eq!(
            parse(&["infra", "publish", "--force"]).expect("extra flags should be ignored"),
            Command::Publish
        );
        assert_eq!(
            parse(&["infra", "deploy:pipeline", "a", "-b"]).expect("alias with extras should parse"),
            Command::DeployPipeline
        );
    }

    #[test]
    fn rejects_unknown_or_missing_commands() {
        assert!(parse(&["infra", "launch"]).is_err());
        assert!(parse(&["infra"]).is_err());
    }
}
