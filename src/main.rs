use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use git_flow_release::config::{self, WorkflowConfig};
use git_flow_release::domain::Version;
use git_flow_release::git::GitCli;
use git_flow_release::{ui, workflow, ReleaseError};

#[derive(Parser)]
#[command(
    name = "git-flow-release",
    about = "Automate the Gitflow release branching workflow"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cut a release/<version> branch off the development branch
    Start {
        #[arg(
            short = 'V',
            long,
            help = "Release version to use instead of deriving it from the marker"
        )]
        version: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Merge the release branch into the trunk, tag it, and restore the
    /// development version
    Finish {
        #[arg(long, help = "Skip the trunk branch and tag off the release branch")]
        no_trunk: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, help = "Remote to fetch from and push to")]
    remote: Option<String>,

    #[arg(long, help = "Development branch name")]
    develop: Option<String>,

    #[arg(long, help = "Trunk branch name")]
    trunk: Option<String>,

    #[arg(long, help = "Path to the version marker file")]
    version_file: Option<PathBuf>,

    #[arg(long, help = "Emit the result as JSON instead of human text")]
    json: bool,

    #[arg(short, long, help = "Enable debug logging")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let common = match &cli.command {
        Command::Start { common, .. } => common,
        Command::Finish { common, .. } => common,
    };
    let debug = common.debug;
    init_tracing(debug);

    if install_interrupt_handler().is_err() {
        tracing::debug!("interrupt handler could not be installed");
    }

    if let Err(e) = run(cli.command) {
        ui::display_error(&e.to_string());
        if debug {
            if let Some(diagnostic) = e
                .downcast_ref::<ReleaseError>()
                .and_then(ReleaseError::diagnostic)
            {
                ui::display_diagnostic(diagnostic);
            }
        }
        std::process::exit(1);
    }
}

/// A user interrupt stops the run immediately with exit code 0.
fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| std::process::exit(0))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Start { version, common } => {
            let config = resolve_config(&common, false)?;
            let explicit = version.as_deref().map(Version::parse).transpose()?;

            let git = GitCli::new();
            let outcome = workflow::start(&git, &config, explicit)?;

            if common.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                ui::display_start_outcome(&outcome);
            }
        }
        Command::Finish { no_trunk, common } => {
            let config = resolve_config(&common, no_trunk)?;

            let git = GitCli::new();
            let outcome = workflow::finish(&git, &config)?;

            if common.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                ui::display_finish_outcome(&outcome);
            }
        }
    }

    Ok(())
}

/// File configuration overridden by the CLI flags of this invocation
fn resolve_config(common: &CommonArgs, no_trunk: bool) -> Result<WorkflowConfig> {
    let mut config = config::load_config(common.config.as_deref())?;

    if let Some(remote) = &common.remote {
        config.remote = Some(remote.clone());
    }
    if let Some(develop) = &common.develop {
        config.development_branch = develop.clone();
    }
    if let Some(trunk) = &common.trunk {
        config.trunk_branch = Some(trunk.clone());
    }
    if let Some(path) = &common.version_file {
        config.version_file = path.clone();
    }
    if no_trunk {
        config.trunk_branch = None;
    }

    Ok(config)
}

/// Console logging, debug level when `--debug` is set.
///
/// Debug level surfaces every executed git command and the stderr lines of
/// failed ones.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
