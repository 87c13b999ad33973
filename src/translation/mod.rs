/*!
 * Translation synchronisation with the translation platform.
 *
 * The workflow runs in four phases per repository, each in its own submodule:
 *
 * - `messages`: regenerate the source message catalogs and open a PR
 * - `push`: upload source files to the platform
 * - `build`: trigger a build of the translation archive
 * - `pull`: bring approved translations back as one branch/PR per language
 *
 * Shared pieces live in `catalog` (triviality filter) and `status`
 * (status tree and approved-file resolution).
 */

use log::{debug, info};
use std::path::Path;

use crate::app_config::TranslationConfig;
use crate::errors::AppError;
use crate::git::Git;
use crate::providers::{NewPullRequest, RepositoryRef, SourceHost, TranslationPlatform};

pub mod build;
pub mod catalog;
pub mod messages;
pub mod pull;
pub mod push;
pub mod status;

pub use self::build::build_project;
pub use self::messages::update_source_message_file;
pub use self::pull::pull_translations;
pub use self::push::push_source_files;

/// Prefix of every branch the bot creates
pub const BRANCH_PREFIX: &str = "translation-";

/// Label added to translation pull requests
pub const PULL_REQUEST_LABEL: &str = "internationalization";

/// Everything a translation phase needs for one repository
pub struct TranslationContext<'a> {
    /// Repository on the source host
    pub repository: &'a RepositoryRef,
    /// Working tree of the clone
    pub git: &'a Git,
    /// `translation` section of the repository configuration
    pub config: &'a TranslationConfig,
    /// Translation platform client for the repository's project
    pub platform: &'a dyn TranslationPlatform,
    /// Source host client
    pub host: &'a dyn SourceHost,
    /// Directory holding the clones, used for downloaded translations
    pub workspace: &'a Path,
}

impl TranslationContext<'_> {
    /// Root of the working tree
    pub fn directory(&self) -> &Path {
        self.git.dir()
    }
}

/// Name of a bot branch, e.g. `translation-de`
pub fn branch_name(suffix: &str) -> String {
    format!("{}{}", BRANCH_PREFIX, suffix)
}

/// Commit and push staged changes, if there are any
///
/// Returns whether anything was pushed.
pub async fn commit_and_push(git: &Git, message: &str, branch: &str) -> Result<bool, AppError> {
    if !git.has_staged_changes().await? {
        return Ok(false);
    }
    git.commit(message).await?;
    git.push(branch).await?;
    Ok(true)
}

/// Open a pull request from `branch` into `base` unless one is already open
///
/// Returns the number of the newly created pull request.
pub async fn ensure_pull_request(
    context: &TranslationContext<'_>,
    branch: &str,
    base: &str,
    title: String,
    body: String,
) -> Result<Option<u64>, AppError> {
    let existing = context.host.pulls_by_head(context.repository, branch, base).await?;
    if let Some(pull) = existing.first() {
        debug!("Pull request #{} already open for '{}'", pull.number, branch);
        return Ok(None);
    }

    let pull = context
        .host
        .create_pull(
            context.repository,
            &NewPullRequest {
                title,
                head: branch.to_string(),
                base: base.to_string(),
                body,
            },
        )
        .await?;
    context
        .host
        .add_labels(context.repository, pull.number, &[PULL_REQUEST_LABEL.to_string()])
        .await?;
    info!("Created pull request #{} for '{}'", pull.number, branch);
    Ok(Some(pull.number))
}
