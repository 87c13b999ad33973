/*!
 * In-memory fakes for testing.
 *
 * Both fakes keep their state behind a `parking_lot::Mutex` and record every
 * mutating call in order, so workflows can be asserted without network access:
 * - `MockTranslationPlatform` - remembers created directories and files and
 *   answers with the platform's "already exists" error codes on repeats
 * - `MockSourceHost` - stores issues, comments, labels and pull requests
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::errors::{DIRECTORY_EXISTS_CODE, FILE_NEEDS_UPDATE_CODE, HostError, PlatformError};
use crate::providers::{
    ExportStatus, FileUpload, Issue, IssueState, IssueUpdate, LanguageProgress, NewPullRequest, PullRequest,
    RemoteRepository, RepositoryRef, SourceHost, SupportedLanguage, TranslationPlatform,
};
use crate::translation::status::LanguageStatus;

/// A call made against [`MockTranslationPlatform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// `add-directory`, with whether the directory was actually created
    AddDirectory { path: String, created: bool },
    /// `add-file`, with whether the file was actually created
    AddFile { path: String, created: bool },
    /// `update-file`
    UpdateFile { path: String },
    /// `export`
    Export,
    /// `download/all.zip`
    Download,
}

#[derive(Debug, Default)]
struct PlatformState {
    directories: BTreeSet<String>,
    files: BTreeSet<String>,
    failing_files: BTreeSet<String>,
    uploads: BTreeMap<String, FileUpload>,
    calls: Vec<PlatformCall>,
    progress: Vec<LanguageProgress>,
    language_status: BTreeMap<String, LanguageStatus>,
    supported: Vec<SupportedLanguage>,
    archive: BTreeMap<String, String>,
}

/// Fake translation platform
#[derive(Debug, Default)]
pub struct MockTranslationPlatform {
    state: Mutex<PlatformState>,
}

impl MockTranslationPlatform {
    /// Create an empty platform
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `path` was uploaded before
    pub fn with_existing_file(self, path: &str) -> Self {
        self.state.lock().files.insert(path.to_string());
        self
    }

    /// Pretend `path` was created before
    pub fn with_existing_directory(self, path: &str) -> Self {
        self.state.lock().directories.insert(path.to_string());
        self
    }

    /// Make uploads of `path` fail with an HTTP 500
    pub fn with_failing_file(self, path: &str) -> Self {
        self.state.lock().failing_files.insert(path.to_string());
        self
    }

    /// Register a project language with its progress and status tree
    pub fn with_language(self, code: &str, words_approved: u64, status: LanguageStatus) -> Self {
        {
            let mut state = self.state.lock();
            state.progress.push(LanguageProgress {
                code: code.to_string(),
                name: code.to_string(),
                words_approved,
            });
            state.language_status.insert(code.to_string(), status);
        }
        self
    }

    /// Register a supported language
    pub fn with_supported_language(self, crowdin_code: &str, osx_locale: &str) -> Self {
        self.state.lock().supported.push(SupportedLanguage {
            crowdin_code: crowdin_code.to_string(),
            osx_locale: osx_locale.to_string(),
            name: crowdin_code.to_string(),
        });
        self
    }

    /// Add a file to the downloadable archive
    pub fn with_archive_file(self, path: &str, content: &str) -> Self {
        self.state.lock().archive.insert(path.to_string(), content.to_string());
        self
    }

    /// Every recorded call in order
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().calls.clone()
    }

    /// Last upload seen for a remote path
    pub fn upload(&self, path: &str) -> Option<FileUpload> {
        self.state.lock().uploads.get(path).cloned()
    }
}

#[async_trait]
impl TranslationPlatform for MockTranslationPlatform {
    async fn add_directory(&self, path: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let created = state.directories.insert(path.to_string());
        state.calls.push(PlatformCall::AddDirectory {
            path: path.to_string(),
            created,
        });
        if created {
            Ok(())
        } else {
            Err(PlatformError::Api {
                status: 400,
                code: DIRECTORY_EXISTS_CODE,
                message: "Directory with such name already exists".to_string(),
            })
        }
    }

    async fn add_file(&self, upload: &FileUpload) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let path = upload.remote_path.clone();
        if state.failing_files.contains(&path) {
            return Err(PlatformError::Http {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        let created = state.files.insert(path.clone());
        state.calls.push(PlatformCall::AddFile {
            path: path.clone(),
            created,
        });
        if created {
            state.uploads.insert(path, upload.clone());
            Ok(())
        } else {
            Err(PlatformError::Api {
                status: 400,
                code: FILE_NEEDS_UPDATE_CODE,
                message: "File with such name is already uploaded".to_string(),
            })
        }
    }

    async fn update_file(&self, upload: &FileUpload) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let path = upload.remote_path.clone();
        state.calls.push(PlatformCall::UpdateFile { path: path.clone() });
        state.uploads.insert(path, upload.clone());
        Ok(())
    }

    async fn export(&self) -> Result<ExportStatus, PlatformError> {
        self.state.lock().calls.push(PlatformCall::Export);
        Ok(ExportStatus {
            status: "built".to_string(),
        })
    }

    async fn project_status(&self) -> Result<Vec<LanguageProgress>, PlatformError> {
        Ok(self.state.lock().progress.clone())
    }

    async fn language_status(&self, language: &str) -> Result<LanguageStatus, PlatformError> {
        Ok(self
            .state
            .lock()
            .language_status
            .get(language)
            .cloned()
            .unwrap_or_default())
    }

    async fn supported_languages(&self) -> Result<Vec<SupportedLanguage>, PlatformError> {
        Ok(self.state.lock().supported.clone())
    }

    async fn download_translations(&self, destination: &Path) -> Result<(), PlatformError> {
        let archive = {
            let mut state = self.state.lock();
            state.calls.push(PlatformCall::Download);
            state.archive.clone()
        };
        for (path, content) in archive {
            let target = destination.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| PlatformError::Archive(e.to_string()))?;
            }
            std::fs::write(&target, content).map_err(|e| PlatformError::Archive(e.to_string()))?;
        }
        Ok(())
    }
}

/// A mutating call made against [`MockSourceHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    CreateIssue { title: String, body: String },
    UpdateIssue { number: u64, update: IssueUpdate },
    CreateComment { number: u64, body: String },
    AddLabels { number: u64, labels: Vec<String> },
    CreatePull(NewPullRequest),
}

#[derive(Debug)]
struct HostState {
    repositories: Vec<RemoteRepository>,
    files: BTreeMap<(String, String), String>,
    issues: Vec<(String, Issue)>,
    pulls: Vec<PullRequest>,
    calls: Vec<HostCall>,
    next_number: u64,
    creator: String,
}

/// Fake source host
#[derive(Debug)]
pub struct MockSourceHost {
    state: Mutex<HostState>,
}

impl Default for MockSourceHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSourceHost {
    /// Create an empty host; issues created through it are filed by `uccser-bot`
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                repositories: Vec::new(),
                files: BTreeMap::new(),
                issues: Vec::new(),
                pulls: Vec::new(),
                calls: Vec::new(),
                next_number: 1,
                creator: "uccser-bot".to_string(),
            }),
        }
    }

    /// Add a repository, optionally with its `.arnold.yaml` content
    pub fn with_repository(self, name: &str, config: Option<&str>) -> Self {
        let url = format!("git@github.com:uccser/{}.git", name);
        self.with_repository_at(name, &url, config)
    }

    /// Add a repository cloned from `url` (e.g. a local bare repository)
    pub fn with_repository_at(self, name: &str, url: &str, config: Option<&str>) -> Self {
        {
            let mut state = self.state.lock();
            state.repositories.push(RemoteRepository {
                name: name.to_string(),
                full_name: format!("uccser/{}", name),
                ssh_url: url.to_string(),
                clone_url: url.to_string(),
            });
            if let Some(config) = config {
                state.files.insert(
                    (name.to_string(), crate::app_config::PROJECT_CONFIG_FILE.to_string()),
                    config.to_string(),
                );
            }
        }
        self
    }

    /// Add an open issue filed by `creator`
    pub fn with_issue(self, creator: &str, title: &str, body: &str) -> Self {
        {
            let mut state = self.state.lock();
            let number = state.next_number;
            state.next_number += 1;
            state.issues.push((
                creator.to_string(),
                Issue {
                    number,
                    title: title.to_string(),
                    body: body.to_string(),
                    state: IssueState::Open,
                },
            ));
        }
        self
    }

    /// Add an open pull request
    pub fn with_pull(self, head: &str, base: &str) -> Self {
        {
            let mut state = self.state.lock();
            let number = state.next_number;
            state.next_number += 1;
            state.pulls.push(PullRequest {
                number,
                title: format!("Existing pull request for {}", head),
                head: head.to_string(),
                base: base.to_string(),
            });
        }
        self
    }

    /// Every recorded mutating call in order
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// Current state of every stored issue
    pub fn issues(&self) -> Vec<Issue> {
        self.state.lock().issues.iter().map(|(_, issue)| issue.clone()).collect()
    }
}

#[async_trait]
impl SourceHost for MockSourceHost {
    async fn list_repositories(&self, _owner: &str) -> Result<Vec<RemoteRepository>, HostError> {
        Ok(self.state.lock().repositories.clone())
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<RemoteRepository, HostError> {
        self.state
            .lock()
            .repositories
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| HostError::RepositoryNotFound(format!("{}/{}", owner, name)))
    }

    async fn get_file_contents(&self, repo: &RepositoryRef, path: &str) -> Result<Option<String>, HostError> {
        Ok(self
            .state
            .lock()
            .files
            .get(&(repo.name.clone(), path.to_string()))
            .cloned())
    }

    async fn issues_by_creator(&self, _repo: &RepositoryRef, creator: &str) -> Result<Vec<Issue>, HostError> {
        Ok(self
            .state
            .lock()
            .issues
            .iter()
            .filter(|(c, issue)| c == creator && issue.state == IssueState::Open)
            .map(|(_, issue)| issue.clone())
            .collect())
    }

    async fn create_issue(&self, _repo: &RepositoryRef, title: &str, body: &str) -> Result<Issue, HostError> {
        let mut state = self.state.lock();
        let issue = Issue {
            number: state.next_number,
            title: title.to_string(),
            body: body.to_string(),
            state: IssueState::Open,
        };
        state.next_number += 1;
        let creator = state.creator.clone();
        state.issues.push((creator, issue.clone()));
        state.calls.push(HostCall::CreateIssue {
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(issue)
    }

    async fn update_issue(&self, _repo: &RepositoryRef, number: u64, update: &IssueUpdate) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let (_, issue) = state
            .issues
            .iter_mut()
            .find(|(_, issue)| issue.number == number)
            .ok_or_else(|| HostError::Other(format!("No issue #{}", number)))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = body.clone();
        }
        if let Some(issue_state) = update.state {
            issue.state = issue_state;
        }
        state.calls.push(HostCall::UpdateIssue {
            number,
            update: update.clone(),
        });
        Ok(())
    }

    async fn create_comment(&self, _repo: &RepositoryRef, number: u64, body: &str) -> Result<(), HostError> {
        self.state.lock().calls.push(HostCall::CreateComment {
            number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn add_labels(&self, _repo: &RepositoryRef, number: u64, labels: &[String]) -> Result<(), HostError> {
        self.state.lock().calls.push(HostCall::AddLabels {
            number,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn pulls_by_head(&self, _repo: &RepositoryRef, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError> {
        Ok(self
            .state
            .lock()
            .pulls
            .iter()
            .filter(|p| p.head == head && p.base == base)
            .cloned()
            .collect())
    }

    async fn create_pull(&self, _repo: &RepositoryRef, pull: &NewPullRequest) -> Result<PullRequest, HostError> {
        let mut state = self.state.lock();
        let created = PullRequest {
            number: state.next_number,
            title: pull.title.clone(),
            head: pull.head.clone(),
            base: pull.base.clone(),
        };
        state.next_number += 1;
        state.pulls.push(created.clone());
        state.calls.push(HostCall::CreatePull(pull.clone()));
        Ok(created)
    }
}
