use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

// Application configuration module
// This module handles the per-repository configuration file, the secrets
// file and the run settings assembled from the command line.

/// Name of the configuration file looked up in every repository
pub const PROJECT_CONFIG_FILE: &str = ".arnold.yaml";

/// Locale code of the source language in repository paths
pub const SOURCE_LANGUAGE: &str = "en";

/// Placeholder replaced by a locale code in configured paths
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Secrets that must exist before any repository work starts
pub const REQUIRED_SECRETS: &[(&str, &str)] =
    &[("GITHUB_TOKEN", "OAuth token to use for GitHub API requests")];

/// Per-repository configuration read from `.arnold.yaml`
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    /// Broken link checker toggle or options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken_link_checker: Option<LinkCheckerSetting>,

    /// Translation synchronisation settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationConfig>,
}

/// `broken-link-checker` may be a plain toggle or a table of options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum LinkCheckerSetting {
    /// `broken-link-checker: true`
    Enabled(bool),
    /// `broken-link-checker: { ... }`
    Options(LinkCheckerOptions),
}

impl LinkCheckerSetting {
    // @returns: Effective options, None when the checker is switched off
    pub fn options(&self) -> Option<LinkCheckerOptions> {
        match self {
            Self::Enabled(true) => Some(LinkCheckerOptions::default()),
            Self::Enabled(false) => None,
            Self::Options(options) => Some(options.clone()),
        }
    }
}

/// Options for the broken link checker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LinkCheckerOptions {
    /// Directories (relative to the repository root) that are never scanned
    #[serde(default = "default_exclude_directories")]
    pub exclude_directories: Vec<String>,

    /// File extensions that are scanned for URLs
    #[serde(default = "default_link_file_types")]
    pub file_types: Vec<String>,

    /// URLs that are never requested
    #[serde(default)]
    pub skip_urls: Vec<String>,

    /// Timeout for each URL request
    #[serde(default = "default_link_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LinkCheckerOptions {
    fn default() -> Self {
        Self {
            exclude_directories: default_exclude_directories(),
            file_types: default_link_file_types(),
            skip_urls: Vec::new(),
            timeout_secs: default_link_timeout_secs(),
        }
    }
}

/// Translation section of the repository configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TranslationConfig {
    /// Branches used for each role
    #[serde(default)]
    pub branches: Branches,

    /// Directories holding source content, templated with `{language}`
    #[serde(default)]
    pub source_directories: Vec<String>,

    /// File extensions uploaded to the translation platform
    #[serde(default)]
    pub file_types: Vec<String>,

    /// Files copied verbatim from the source locale, templated with `{language}`
    #[serde(default)]
    pub file_overrides: Vec<String>,

    /// Crowdin code to repository locale code, applied after the built-in overrides
    #[serde(default)]
    pub language_mapping_overrides: BTreeMap<String, String>,

    /// Project specific commands
    #[serde(default)]
    pub commands: ProjectCommands,

    /// Source language message catalog(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub django_message_file: Option<MessageFiles>,
}

/// Branch names for each translation role
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Branches {
    /// Branch whose content is uploaded to the platform
    #[serde(default = "default_branch")]
    pub translation_source: String,

    /// Branch new translations are merged into
    #[serde(default = "default_branch")]
    pub translation_target: String,

    /// Branch updated source message files are merged into
    #[serde(default = "default_branch")]
    pub update_messages_target: String,
}

impl Default for Branches {
    fn default() -> Self {
        Self {
            translation_source: default_branch(),
            translation_target: default_branch(),
            update_messages_target: default_branch(),
        }
    }
}

/// Commands run while regenerating message catalogs
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ProjectCommands {
    /// Run before `makemessages` (e.g. start containers)
    #[serde(default)]
    pub start: CommandList,

    /// Run after `makemessages` (e.g. stop containers)
    #[serde(default)]
    pub end: CommandList,

    /// Regenerates the source message catalog(s)
    #[serde(default)]
    pub makemessages: CommandList,
}

/// A single argv list or a list of argv lists
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CommandList {
    /// `[["./csu", "start"], ["./csu", "update"]]`
    Many(Vec<Vec<String>>),
    /// `["./csu", "end"]`
    One(Vec<String>),
}

impl Default for CommandList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl CommandList {
    /// Commands in execution order, empty argv lists dropped
    pub fn commands(&self) -> Vec<Vec<String>> {
        match self {
            Self::Many(commands) => commands.iter().filter(|c| !c.is_empty()).cloned().collect(),
            Self::One(command) if command.is_empty() => Vec::new(),
            Self::One(command) => vec![command.clone()],
        }
    }
}

/// `django-message-file` may be a single path or a list of paths
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageFiles {
    /// One catalog
    One(String),
    /// Several catalogs
    Many(Vec<String>),
}

impl MessageFiles {
    /// Catalog paths relative to the repository root
    pub fn paths(&self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path.clone()],
            Self::Many(paths) => paths.clone(),
        }
    }
}

impl RepositoryConfig {
    /// Parse a repository configuration document
    ///
    /// An empty document yields a configuration with every feature off.
    pub fn from_yaml(text: &str, source_name: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ConfigError::InvalidYaml {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Link checker options when the checker is enabled
    pub fn link_checker(&self) -> Option<LinkCheckerOptions> {
        self.broken_link_checker.as_ref().and_then(LinkCheckerSetting::options)
    }

    /// Whether the file enables anything at all
    pub fn is_empty(&self) -> bool {
        self.link_checker().is_none() && self.translation.is_none()
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(translation) = &self.translation else {
            return Ok(());
        };

        if translation.source_directories.is_empty() {
            return Err(ConfigError::Invalid(
                "translation.source-directories must list at least one directory".to_string(),
            ));
        }
        if let Some(directory) = translation
            .source_directories
            .iter()
            .find(|d| !d.contains(LANGUAGE_PLACEHOLDER))
        {
            return Err(ConfigError::Invalid(format!(
                "source directory '{}' has no {} placeholder",
                directory, LANGUAGE_PLACEHOLDER
            )));
        }
        if translation.file_types.is_empty() {
            return Err(ConfigError::Invalid(
                "translation.file-types must list at least one extension".to_string(),
            ));
        }

        let branches = &translation.branches;
        for (role, branch) in [
            ("translation-source", &branches.translation_source),
            ("translation-target", &branches.translation_target),
            ("update-messages-target", &branches.update_messages_target),
        ] {
            if branch.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("branch '{}' is empty", role)));
            }
        }

        Ok(())
    }
}

impl TranslationConfig {
    /// Source directories with the placeholder replaced by `language`
    pub fn source_directories_for(&self, language: &str) -> Vec<String> {
        self.source_directories
            .iter()
            .map(|d| d.replace(LANGUAGE_PLACEHOLDER, language))
            .collect()
    }

    /// Whether a file name carries one of the configured extensions
    pub fn allows_file(&self, file_name: &str) -> bool {
        self.file_types.iter().any(|ext| file_name.ends_with(ext.as_str()))
    }

    /// Configured source message catalogs
    pub fn message_files(&self) -> Vec<String> {
        self.django_message_file
            .as_ref()
            .map(MessageFiles::paths)
            .unwrap_or_default()
    }
}

/// Secrets read from the secrets YAML file
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    values: BTreeMap<String, String>,
}

impl Secrets {
    /// Read and parse the secrets file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&text, &path.display().to_string())
    }

    /// Parse a secrets document (a flat mapping of keys to scalars)
    pub fn from_yaml(text: &str, source_name: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(text).map_err(|e| ConfigError::InvalidYaml {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

        let values = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();

        Ok(Self { values })
    }

    /// Build secrets from key/value pairs
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Look up a secret
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Fail on the first missing required secret
    pub fn require(&self, required: &[(&str, &str)]) -> Result<(), ConfigError> {
        for (key, description) in required {
            if self.get(key).is_none() {
                return Err(ConfigError::MissingSecret {
                    key: key.to_string(),
                    description: description.to_string(),
                });
            }
            log::debug!("  - '{}' set correctly.", key);
        }
        Ok(())
    }

    /// Token for the source hosting API
    pub fn github_token(&self) -> Result<&str, ConfigError> {
        self.get("GITHUB_TOKEN").ok_or_else(|| ConfigError::MissingSecret {
            key: "GITHUB_TOKEN".to_string(),
            description: REQUIRED_SECRETS[0].1.to_string(),
        })
    }

    /// Crowdin API key for a repository
    pub fn crowdin_api_key(&self, project_name: &str) -> Result<&str, ConfigError> {
        let key = crowdin_key_name(project_name);
        log::debug!("Checking for secret '{}'", key);
        self.get(&key).ok_or_else(|| ConfigError::MissingSecret {
            description: format!("Crowdin API key for project '{}'", project_name),
            key,
        })
    }
}

/// Secret key holding the Crowdin API key of a project
///
/// The name is upper-cased and everything outside `A-Z` is dropped,
/// so `cs-unplugged` becomes `CSUNPLUGGED_CROWDIN_API_KEY`.
pub fn crowdin_key_name(project_name: &str) -> String {
    let mut key: String = project_name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase())
        .collect();
    key.push_str("_CROWDIN_API_KEY");
    key
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Settings for one run of the bot, assembled from the command line
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory repositories are cloned into
    pub projects_dir: PathBuf,
    /// Account owning the repositories
    pub owner: String,
    /// Login of the bot account that files issues
    pub bot_login: String,
    /// Reuse existing clones
    pub skip_clone: bool,
    /// Only process this repository
    pub repository: Option<String>,
    /// Never run the broken link checker
    pub skip_link_checker: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from(default_projects_dir()),
            owner: default_owner(),
            bot_login: default_bot_login(),
            skip_clone: false,
            repository: None,
            skip_link_checker: false,
        }
    }
}

fn default_branch() -> String {
    "develop".to_string()
}

fn default_exclude_directories() -> Vec<String> {
    vec![".git/".to_string(), "node_modules/".to_string(), "venv/".to_string()]
}

fn default_link_file_types() -> Vec<String> {
    [".md", ".txt", ".rst", ".html", ".css", ".py", ".js", ".yaml", ".yml"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_link_timeout_secs() -> u64 {
    30
}

pub fn default_projects_dir() -> String {
    "projects".to_string()
}

pub fn default_owner() -> String {
    "uccser".to_string()
}

pub fn default_bot_login() -> String {
    "uccser-bot".to_string()
}
