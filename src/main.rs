// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use arnold::app_config::{self, REQUIRED_SECRETS, Secrets, Settings};
use arnold::app_controller::{Controller, RepositoryOutcome};
use arnold::providers::github::GitHub;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for arnold
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arnold - repository maintenance bot
///
/// Checks repositories for broken links and keeps their translations in sync
/// with Crowdin.
#[derive(Parser, Debug)]
#[command(name = "arnold")]
#[command(version)]
#[command(about = "Repository maintenance bot for broken links and translations")]
#[command(long_about = "Arnold walks every repository of an owner, reads its .arnold.yaml and runs the enabled tasks:
a broken link checker that files and maintains an issue, and a Crowdin translation workflow
(regenerate message files, upload sources, build, pull approved translations as pull requests).

EXAMPLES:
    arnold                                   # Process every repository
    arnold -r cs-unplugged                   # Process a single repository
    arnold -c -r cs-unplugged                # Reuse the existing clone
    arnold --log-level debug                 # Verbose output
    arnold completions bash > arnold.bash    # Generate bash completions

SECRETS:
    Secrets are read from secrets.yaml by default. GITHUB_TOKEN is required, and each
    translated project needs <NAME>_CROWDIN_API_KEY (e.g. CSUNPLUGGED_CROWDIN_API_KEY).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Reuse existing clones instead of cloning again
    #[arg(short = 'c', long)]
    skip_clone: bool,

    /// Only process this repository
    #[arg(short, long)]
    repo: Option<String>,

    /// Do not run the broken link checker
    #[arg(long)]
    skip_link_checker: bool,

    /// Secrets file path
    #[arg(short, long, default_value = "secrets.yaml")]
    secrets: PathBuf,

    /// Directory repositories are cloned into
    #[arg(long, default_value_t = app_config::default_projects_dir())]
    projects_dir: String,

    /// Account owning the repositories
    #[arg(long, default_value_t = app_config::default_owner())]
    owner: String,

    /// Login of the bot account
    #[arg(long, default_value_t = app_config::default_bot_login())]
    bot_login: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at trace so the max level alone decides what gets printed
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "arnold", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level_filter(&level));
    }

    run(cli).await
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    info!("Loading secrets from {}", cli.secrets.display());
    let secrets = Secrets::load(&cli.secrets).context("Failed to load secrets")?;
    secrets.require(REQUIRED_SECRETS).context("Required secrets missing")?;

    let host = GitHub::new(secrets.github_token()?).context("Failed to create GitHub client")?;

    let settings = Settings {
        projects_dir: PathBuf::from(&cli.projects_dir),
        owner: cli.owner,
        bot_login: cli.bot_login,
        skip_clone: cli.skip_clone,
        repository: cli.repo,
        skip_link_checker: cli.skip_link_checker,
    };
    debug!("Settings: {:?}", settings);

    let controller = Controller::new(settings, secrets, Arc::new(host));
    let outcomes = controller.run().await?;

    let processed = outcomes
        .iter()
        .filter(|(_, outcome)| *outcome == RepositoryOutcome::Processed)
        .count();
    info!("Processed {} of {} repositories", processed, outcomes.len());
    Ok(())
}
