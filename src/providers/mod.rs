/*!
 * Client implementations for the external services arnold talks to.
 *
 * This module defines the narrow interfaces the workflows depend on:
 * - `TranslationPlatform`: upload source files and query/download translations
 * - `SourceHost`: issues, pull requests, labels and file contents
 *
 * and their implementations:
 * - `crowdin`: Crowdin v1 REST API client
 * - `github`: GitHub API client
 * - `mock`: in-memory fakes recording every call, for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::errors::{HostError, PlatformError};
use crate::translation::status::LanguageStatus;

pub mod crowdin;
pub mod github;
pub mod mock;

/// A source file to upload to the translation platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Path of the file on the platform (repository-relative)
    pub remote_path: String,
    /// Export pattern telling the platform where translations belong
    pub export_pattern: String,
    /// File on disk
    pub local_path: PathBuf,
}

/// Outcome of a build (export) request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportStatus {
    /// `built` or `skipped`
    pub status: String,
}

/// Progress of one language in the project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageProgress {
    /// Platform language code
    pub code: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Number of approved words
    #[serde(deserialize_with = "deserialize_count", default)]
    pub words_approved: u64,
}

/// One entry of the platform's supported languages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupportedLanguage {
    /// Platform language code
    pub crowdin_code: String,
    /// Locale code used for `%osx_locale%` in export patterns
    pub osx_locale: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// Interface to the translation platform
///
/// Every method maps onto one REST call. Error codes reported by the
/// platform surface as [`PlatformError::Api`] so callers can branch on them.
#[async_trait]
pub trait TranslationPlatform: Send + Sync + Debug {
    /// Create a directory node (`add-directory`)
    async fn add_directory(&self, path: &str) -> Result<(), PlatformError>;

    /// Upload a new file (`add-file`)
    async fn add_file(&self, upload: &FileUpload) -> Result<(), PlatformError>;

    /// Replace an existing file (`update-file`)
    async fn update_file(&self, upload: &FileUpload) -> Result<(), PlatformError>;

    /// Trigger a build of the translation archive (`export`)
    async fn export(&self) -> Result<ExportStatus, PlatformError>;

    /// Progress of every project language (`status`)
    async fn project_status(&self) -> Result<Vec<LanguageProgress>, PlatformError>;

    /// Per-file status tree for one language (`language-status`)
    async fn language_status(&self, language: &str) -> Result<LanguageStatus, PlatformError>;

    /// Languages known to the platform (`supported-languages`)
    async fn supported_languages(&self) -> Result<Vec<SupportedLanguage>, PlatformError>;

    /// Download the translation archive and unpack it into `destination`
    async fn download_translations(&self, destination: &Path) -> Result<(), PlatformError>;
}

/// Owner/name pair identifying a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    /// Account or organisation
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A repository as listed by the source host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepository {
    /// Repository name
    pub name: String,
    /// `owner/name`
    #[serde(default)]
    pub full_name: String,
    /// SSH clone URL
    #[serde(default)]
    pub ssh_url: String,
    /// HTTPS clone URL
    #[serde(default)]
    pub clone_url: String,
}

/// Issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

/// An issue (only the fields arnold reads)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub body: String,
    #[serde(default)]
    pub state: IssueState,
}

/// Changes applied to an issue; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
}

/// A pull request (only the fields arnold reads)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
}

/// A pull request to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    /// Head branch name (same repository)
    pub head: String,
    /// Base branch name
    pub base: String,
    pub body: String,
}

/// Interface to the source hosting service
#[async_trait]
pub trait SourceHost: Send + Sync + Debug {
    /// Every repository of `owner`
    async fn list_repositories(&self, owner: &str) -> Result<Vec<RemoteRepository>, HostError>;

    /// One repository of `owner`
    async fn get_repository(&self, owner: &str, name: &str) -> Result<RemoteRepository, HostError>;

    /// Decoded content of a file on the default branch, `None` when absent
    async fn get_file_contents(&self, repo: &RepositoryRef, path: &str) -> Result<Option<String>, HostError>;

    /// Open issues filed by `creator`
    async fn issues_by_creator(&self, repo: &RepositoryRef, creator: &str) -> Result<Vec<Issue>, HostError>;

    /// File a new issue
    async fn create_issue(&self, repo: &RepositoryRef, title: &str, body: &str) -> Result<Issue, HostError>;

    /// Edit title, body or state of an issue
    async fn update_issue(&self, repo: &RepositoryRef, number: u64, update: &IssueUpdate) -> Result<(), HostError>;

    /// Comment on an issue or pull request
    async fn create_comment(&self, repo: &RepositoryRef, number: u64, body: &str) -> Result<(), HostError>;

    /// Add labels to an issue or pull request
    async fn add_labels(&self, repo: &RepositoryRef, number: u64, labels: &[String]) -> Result<(), HostError>;

    /// Open pull requests from `head` into `base`
    async fn pulls_by_head(&self, repo: &RepositoryRef, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError>;

    /// Open a pull request
    async fn create_pull(&self, repo: &RepositoryRef, pull: &NewPullRequest) -> Result<PullRequest, HostError>;
}

/// Word counts arrive either as numbers or as numeric strings
pub(crate) fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
