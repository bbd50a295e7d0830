use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use git_promote::config::{self, Config, CONFIG_FILE};
use git_promote::domain::Version;
use git_promote::git::Git2Repository;
use git_promote::telemetry;
use git_promote::ui::{self, AssumeYes, Prompter, TerminalPrompter};
use git_promote::workflow::{self, Outcome};

#[derive(Parser)]
#[command(
    name = "git-promote",
    version,
    about = "Promote build artifacts into a shared git repository with per-application tags"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, help = "Log every git operation")]
    verbose: bool,

    #[arg(short = 'y', long, global = true, help = "Skip confirmation prompts")]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the build output into the downstream repository, then commit, tag and push
    Deploy {
        #[arg(long, help = "Show the tags that would be written and stop")]
        dry_run: bool,
    },
    /// Merge the current branch into a release branch
    Merge,
    /// Update CHANGELOG.md and the version, commit, then tag with v{version}[@label]
    Release {
        #[arg(help = "Version to mark, defaults to application.version")]
        version: Option<String>,

        #[arg(short, long, help = "Release line the next deploy goes to (release/{label})")]
        label: Option<String>,
    },
    /// Create gitpromote.toml interactively
    Init,
}

fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let prompter: Box<dyn Prompter> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompter::stdin())
    };
    let prompter = prompter.as_ref();

    match args.command {
        Command::Deploy { dry_run } => {
            let config = load(args.config.as_deref())?;
            let outcome = workflow::deploy(&config, prompter, dry_run)?;
            report(outcome, |r| {
                format!("'{}' updated with {} tags", r.branch, r.tags.len())
            });
        }
        Command::Merge => {
            let config = load(args.config.as_deref())?;
            let repo = Git2Repository::open(".", config.deploy.remote_name.as_str())
                .context("Git repository error")?;
            let outcome = workflow::merge_into_release(&repo, prompter)?;
            report(outcome, |r| {
                format!("'{}' folded into '{}'", r.source, r.release_branch)
            });
        }
        Command::Release { version, label } => {
            let config = load(args.config.as_deref())?;
            let version = match version {
                Some(raw) => Version::parse(&raw)?,
                None => config.candidate_version()?,
            };
            let config_file = config::find_config_file(args.config.as_deref());
            let outcome = workflow::release(
                &config,
                config_file.as_deref(),
                prompter,
                version,
                label.as_deref(),
            )?;
            report(outcome, |r| format!("Released {}", r.marker));
        }
        Command::Init => {
            let path = PathBuf::from(args.config.as_deref().unwrap_or(CONFIG_FILE));
            let existing = if path.exists() {
                load(path.to_str())?
            } else {
                Config::default()
            };
            let outcome = workflow::init(&path, &existing, prompter)?;
            report(outcome, |_| "Configuration saved".to_string());
        }
    }

    Ok(())
}

fn load(config_path: Option<&str>) -> Result<Config> {
    config::load_config(config_path).context("Error loading config")
}

/// Soft endings still exit with success
fn report<T>(outcome: Outcome<T>, describe: impl FnOnce(T) -> String) {
    match outcome {
        Outcome::Completed(value) => println!("\n{}\n", console::style(describe(value)).green()),
        Outcome::NothingToDo(reason) => ui::display_status(&format!("Nothing to do: {}", reason)),
        Outcome::Cancelled(reason) => ui::display_status(&format!("Cancelled: {}", reason)),
    }
}
