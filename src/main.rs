//! semflow - CLI entry point.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use semflow::commits::CommitLinter;
use semflow::config::Config;
use semflow::git::CommandLineGit;
use semflow::strategy::{PerformRelease, PrepareRelease, ReleaseContext, StrategyOutcome};
use semflow::vcs::{AzureDevOps, GitHub, HostOptions, VcsHost};

/// Automate semantic-version releases from conventional commits.
#[derive(Parser, Debug)]
#[command(name = "semflow")]
#[command(about = "Automate semantic-version releases from conventional commits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tag a merged release commit, or prepare the next release PR
    Release(HostArgs),

    /// Validate a pull request title against the configured policy
    LintPr {
        /// The pull request id to validate
        #[arg(long)]
        id: u64,

        #[command(flatten)]
        host: HostArgs,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VcsKind {
    #[value(name = "azure-devops")]
    AzureDevOps,
    Github,
}

/// Connection flags shared by every subcommand.
#[derive(Args, Debug)]
struct HostArgs {
    /// VCS host to talk to
    #[arg(long, value_enum, default_value_t = VcsKind::AzureDevOps)]
    vcs: VcsKind,

    /// Access token to authenticate to the API
    #[arg(long)]
    token: String,

    /// Azure DevOps organization identifier (not used for GitHub)
    #[arg(long, default_value = "")]
    org: String,

    /// Azure DevOps project identifier / GitHub owner
    #[arg(long)]
    project: String,

    /// The repository name
    #[arg(long)]
    repo: String,

    /// The branch releases are tracked on
    #[arg(long)]
    branch: String,
}

impl HostArgs {
    fn options(&self) -> HostOptions {
        HostOptions {
            token: self.token.clone(),
            org: self.org.clone(),
            project: self.project.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
        }
    }

    fn host(&self) -> Result<Box<dyn VcsHost>> {
        if matches!(self.vcs, VcsKind::AzureDevOps) && self.org.is_empty() {
            anyhow::bail!("--org is required for Azure DevOps");
        }

        let opts = self.options();
        let host: Box<dyn VcsHost> = match self.vcs {
            VcsKind::AzureDevOps => Box::new(AzureDevOps::new(&opts)?),
            VcsKind::Github => Box::new(GitHub::new(&opts)?),
        };

        Ok(host)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Release(args) => release(args).await,
        Command::LintPr { id, host } => lint_pr(id, host).await,
    }
}

/// Run the perform strategy, falling through to prepare when the last commit
/// was not a release merge.
async fn release(args: HostArgs) -> Result<()> {
    let cfg = Config::load().context("Could not read the configuration")?;
    let git = CommandLineGit::new(&cfg);
    let host = args.host()?;
    let ctx = ReleaseContext::new(cfg, Box::new(git), host)
        .context("Could not assemble the release context")?;

    let perform = PerformRelease::new(&ctx, &args.branch);
    match perform
        .execute()
        .await
        .context("Perform release strategy failed")?
    {
        StrategyOutcome::Done => {
            info!("A release was performed, nothing further to do on this run");
            return Ok(());
        }
        StrategyOutcome::NotApplicable => {}
    }

    let prepare = PrepareRelease::new(&ctx, &args.branch);
    prepare
        .execute()
        .await
        .context("Prepare release strategy failed")?;

    Ok(())
}

async fn lint_pr(id: u64, args: HostArgs) -> Result<()> {
    let cfg = Config::load().context("Could not read the configuration")?;
    let linter = CommitLinter::new(&cfg).context("Could not build the title linter")?;
    let host = args.host()?;

    let title = host
        .pr_title(id)
        .await
        .with_context(|| format!("Could not retrieve the title of PR {id}"))?;

    if let Err(violation) = linter.lint(&title) {
        error!(pr = id, reason = %violation, "PR title is incorrect");
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SEMFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("semflow=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
