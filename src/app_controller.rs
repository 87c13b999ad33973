use anyhow::{Context, Result, anyhow};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{LinkCheckerOptions, PROJECT_CONFIG_FILE, RepositoryConfig, Secrets, Settings};
use crate::errors::ConfigError;
use crate::file_utils::FileManager;
use crate::git::{BOT_EMAIL, BOT_NAME, Git};
use crate::link_checker::{self, IssueAction, LinkChecker, UrlChecker};
use crate::providers::crowdin::Crowdin;
use crate::providers::{RemoteRepository, RepositoryRef, SourceHost, TranslationPlatform};
use crate::translation::{self, TranslationContext};

// @module: Application controller for repository maintenance

/// Width of the separators printed around each repository
const SEPARATOR_WIDTH: usize = 60;

/// Builds a translation platform client from a project name and API key
pub type PlatformFactory = Box<dyn Fn(&str, &str) -> Arc<dyn TranslationPlatform> + Send + Sync>;

/// What happened to one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOutcome {
    /// No `.arnold.yaml` in the repository
    NotConfigured,
    /// The configuration could not be used
    InvalidConfig(String),
    /// Every configured phase ran
    Processed,
}

/// Measures the time spent in each phase
#[derive(Debug)]
pub struct PhaseTimer {
    start: Instant,
}

impl PhaseTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Log the time since the last lap and restart
    pub fn lap(&mut self) {
        debug!("Process took {}.", format_elapsed(self.start.elapsed()));
        self.start = Instant::now();
    }
}

/// Format a duration as `{minutes}m {seconds:.1}s`
pub fn format_elapsed(duration: Duration) -> String {
    let total = duration.as_secs_f64();
    let minutes = (total / 60.0).floor();
    let seconds = total - minutes * 60.0;
    format!("{:.0}m {:.1}s", minutes, seconds)
}

/// Parse and validate a repository configuration document
pub fn parse_config(text: &str, source_name: &str) -> Result<RepositoryConfig, ConfigError> {
    let config = RepositoryConfig::from_yaml(text, source_name)?;
    config.validate()?;
    Ok(config)
}

/// Main application controller
pub struct Controller {
    // @field: Run settings
    settings: Settings,
    secrets: Secrets,
    host: Arc<dyn SourceHost>,
    platform_factory: PlatformFactory,
    url_checker: Option<Box<dyn UrlChecker>>,
}

impl Controller {
    // @method: Create a new controller talking to Crowdin for translations
    pub fn new(settings: Settings, secrets: Secrets, host: Arc<dyn SourceHost>) -> Self {
        Self {
            settings,
            secrets,
            host,
            platform_factory: Box::new(|project: &str, key: &str| -> Arc<dyn TranslationPlatform> {
                Arc::new(Crowdin::new(project, key))
            }),
            url_checker: None,
        }
    }

    /// Use another translation platform implementation
    pub fn with_platform_factory(mut self, factory: PlatformFactory) -> Self {
        self.platform_factory = factory;
        self
    }

    /// Check URLs with `checker` instead of real HTTP requests
    pub fn with_url_checker(mut self, checker: Box<dyn UrlChecker>) -> Self {
        self.url_checker = Some(checker);
        self
    }

    /// Directory holding the clones
    pub fn projects_dir(&self) -> &Path {
        &self.settings.projects_dir
    }

    /// Process every repository of the owner, or only the selected one
    pub async fn run(&self) -> Result<Vec<(String, RepositoryOutcome)>> {
        let start_time = Instant::now();
        if self.settings.skip_clone {
            info!("Skip cloning repositories turned on.");
        }
        FileManager::ensure_dir(&self.settings.projects_dir)?;

        let repositories = match &self.settings.repository {
            Some(name) => vec![self.host.get_repository(&self.settings.owner, name).await?],
            None => self.host.list_repositories(&self.settings.owner).await?,
        };

        let major = "=".repeat(SEPARATOR_WIDTH);
        let minor = "-".repeat(SEPARATOR_WIDTH);
        let mut outcomes = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let full_name = if repository.full_name.is_empty() {
                format!("{}/{}", self.settings.owner, repository.name)
            } else {
                repository.full_name.clone()
            };
            info!("{}", major);
            info!("{}", full_name);
            info!("{}", minor);

            let outcome = self
                .process_repository(&repository)
                .await
                .with_context(|| format!("Failed to process {}", full_name))?;
            info!("{}", major);
            outcomes.push((repository.name.clone(), outcome));
        }

        info!("Finished in {}", format_elapsed(start_time.elapsed()));
        Ok(outcomes)
    }

    /// Fetch `.arnold.yaml` from the repository
    ///
    /// Returns `None` when the file does not exist. Parse and validation
    /// failures are returned as errors so the caller can skip the repository.
    pub async fn load_config(&self, repository: &RepositoryRef) -> Result<Option<Result<RepositoryConfig, ConfigError>>> {
        let Some(text) = self.host.get_file_contents(repository, PROJECT_CONFIG_FILE).await? else {
            return Ok(None);
        };
        Ok(Some(parse_config(&text, &repository.full_name())))
    }

    async fn process_repository(&self, repository: &RemoteRepository) -> Result<RepositoryOutcome> {
        let reference = RepositoryRef::new(&self.settings.owner, &repository.name);

        let config = match self.load_config(&reference).await? {
            None => {
                info!("Config file for Arnold not detected.");
                return Ok(RepositoryOutcome::NotConfigured);
            }
            Some(Err(e)) => {
                error!("Error! {}", e);
                return Ok(RepositoryOutcome::InvalidConfig(e.to_string()));
            }
            Some(Ok(config)) => {
                info!("Config file for Arnold detected.");
                config
            }
        };
        if config.is_empty() {
            info!("Nothing enabled in config, skipping.");
            return Ok(RepositoryOutcome::Processed);
        }

        let git = self.prepare_working_tree(repository).await?;
        self.run_project(&reference, &config, &git).await?;
        Ok(RepositoryOutcome::Processed)
    }

    /// Clone (or reuse) the working tree and set the bot identity
    pub async fn prepare_working_tree(&self, repository: &RemoteRepository) -> Result<Git> {
        let projects_dir = &self.settings.projects_dir;
        let directory: PathBuf = projects_dir.join(&repository.name);

        let git = if self.settings.skip_clone {
            if !FileManager::dir_exists(&directory) {
                return Err(anyhow!("No existing clone at {:?}", directory));
            }
            let git = Git::new(&directory);
            git.fetch().await?;
            git
        } else {
            if FileManager::dir_exists(&directory) {
                warn!("Existing repository detected! Deleting existing directory...");
                FileManager::remove_dir(&directory)?;
            }
            let url = if repository.ssh_url.is_empty() {
                &repository.clone_url
            } else {
                &repository.ssh_url
            };
            Git::clone_into(projects_dir, url, &repository.name).await?
        };

        git.set_identity(BOT_NAME, BOT_EMAIL).await?;
        Ok(git)
    }

    /// Run every enabled phase for one repository
    pub async fn run_project(&self, repository: &RepositoryRef, config: &RepositoryConfig, git: &Git) -> Result<()> {
        let mut timer = PhaseTimer::start();

        if let Some(options) = config.link_checker() {
            if self.settings.skip_link_checker {
                info!("Skipping broken link checker.");
            } else {
                let action = self.check_links(repository, options, git.dir()).await?;
                debug!("Broken link issue: {:?}", action);
                timer.lap();
            }
        }

        let Some(translation_config) = &config.translation else {
            return Ok(());
        };

        let api_key = self.secrets.crowdin_api_key(&repository.name)?;
        let platform = (self.platform_factory)(&repository.name, api_key);
        let context = TranslationContext {
            repository,
            git,
            config: translation_config,
            platform: platform.as_ref(),
            host: self.host.as_ref(),
            workspace: &self.settings.projects_dir,
        };

        translation::update_source_message_file(&context)
            .await
            .context("Updating source message file failed")?;
        timer.lap();
        translation::push_source_files(&context)
            .await
            .context("Pushing source files failed")?;
        timer.lap();
        translation::build_project(context.platform)
            .await
            .context("Building project failed")?;
        timer.lap();
        translation::pull_translations(&context)
            .await
            .context("Pulling translations failed")?;
        timer.lap();

        Ok(())
    }

    async fn check_links(
        &self,
        repository: &RepositoryRef,
        options: LinkCheckerOptions,
        root: &Path,
    ) -> Result<IssueAction> {
        let checker = LinkChecker::new(options).with_progress(self.url_checker.is_none());
        let http;
        let url_checker: &dyn UrlChecker = match &self.url_checker {
            Some(custom) => custom.as_ref(),
            None => {
                http = checker.http_checker();
                &http
            }
        };

        let report = checker.run(root, url_checker).await?;
        let action = link_checker::reconcile_issue(self.host.as_ref(), repository, &self.settings.bot_login, &report)
            .await?;
        Ok(action)
    }
}
