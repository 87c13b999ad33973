/*!
 * Thin wrapper over the git command line.
 *
 * Every operation runs inside the working tree the [`Git`] value is bound
 * to, so no code in arnold depends on the process working directory.
 */

use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::CommandError;
use crate::shell;

/// Name used for commits made by the bot
pub const BOT_NAME: &str = "UCCSER Bot";

/// Email used for commits made by the bot
pub const BOT_EMAIL: &str = "33709036+uccser-bot@users.noreply.github.com";

/// A git working tree
#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
}

impl Git {
    /// Bind to an existing working tree
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Root of the working tree
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clone `url` into `parent/name` and bind to the result
    pub async fn clone_into(parent: &Path, url: &str, name: &str) -> Result<Self, CommandError> {
        shell::run(parent, &["git", "clone", "--quiet", url, name]).await?;
        Ok(Self::new(parent.join(name)))
    }

    async fn git(&self, args: &[&str]) -> Result<shell::CommandOutput, CommandError> {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push("git");
        command.extend_from_slice(args);
        shell::run(&self.dir, &command).await
    }

    /// Set the committer identity for this working tree
    pub async fn set_identity(&self, name: &str, email: &str) -> Result<(), CommandError> {
        self.git(&["config", "user.name", name]).await?;
        self.git(&["config", "user.email", email]).await?;
        Ok(())
    }

    /// Check out `branch`, creating it from the current HEAD when it does not exist
    pub async fn checkout_branch(&self, branch: &str) -> Result<(), CommandError> {
        match self.git(&["checkout", "--quiet", branch]).await {
            Ok(_) => Ok(()),
            Err(CommandError::Failed { .. }) => {
                debug!("Branch '{}' not found, creating it", branch);
                self.git(&["checkout", "--quiet", "-b", branch]).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Update remote-tracking branches of origin
    pub async fn fetch(&self) -> Result<(), CommandError> {
        self.git(&["fetch", "--quiet", "origin"]).await?;
        Ok(())
    }

    /// Merge `reference` without opening an editor
    pub async fn merge(&self, reference: &str) -> Result<(), CommandError> {
        self.git(&["merge", reference, "--quiet", "--no-edit"]).await?;
        Ok(())
    }

    /// Stage the given paths
    pub async fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<(), CommandError> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(|p| p.as_ref()));
        self.git(&args).await?;
        Ok(())
    }

    /// Stage every change in the working tree
    pub async fn add_all(&self) -> Result<(), CommandError> {
        self.git(&["add", "-A"]).await?;
        Ok(())
    }

    /// Whether anything is staged
    ///
    /// `git diff --cached --quiet` exits with 1 when changes are staged and 0
    /// when none are; any other outcome is a real failure.
    pub async fn has_staged_changes(&self) -> Result<bool, CommandError> {
        let command = ["git", "diff", "--cached", "--quiet"];
        let output = shell::run_unchecked(&self.dir, &command).await?;
        match output.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(CommandError::Failed {
                command: shell::render(&command),
                code,
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }

    /// Commit staged changes
    pub async fn commit(&self, message: &str) -> Result<(), CommandError> {
        self.git(&["commit", "--quiet", "-m", message]).await?;
        Ok(())
    }

    /// Push `branch` to origin
    pub async fn push(&self, branch: &str) -> Result<(), CommandError> {
        self.git(&["push", "--quiet", "origin", branch]).await?;
        Ok(())
    }

    /// Discard tracked changes
    pub async fn reset_hard(&self) -> Result<(), CommandError> {
        self.git(&["reset", "--quiet", "--hard"]).await?;
        Ok(())
    }

    /// Remove untracked and ignored files
    pub async fn clean(&self) -> Result<(), CommandError> {
        self.git(&["clean", "-fdxq"]).await?;
        Ok(())
    }

    /// Hard reset followed by a full clean
    pub async fn reset_and_clean(&self) -> Result<(), CommandError> {
        self.reset_hard().await?;
        self.clean().await
    }

    /// Content of `path` as of the last commit
    pub async fn show_committed(&self, path: &str) -> Result<String, CommandError> {
        let object = format!("HEAD:{}", path);
        let output = shell::run_quiet(&self.dir, &["git", "show", object.as_str()]).await?;
        Ok(output.stdout)
    }

    /// Content of `path` as currently staged
    pub async fn show_staged(&self, path: &str) -> Result<String, CommandError> {
        let object = format!(":{}", path);
        let output = shell::run_quiet(&self.dir, &["git", "show", object.as_str()]).await?;
        Ok(output.stdout)
    }

    /// Remove `path` from the index, keeping the working tree copy
    pub async fn unstage(&self, path: &str) -> Result<(), CommandError> {
        self.git(&["reset", "--quiet", "HEAD", "--", path]).await?;
        Ok(())
    }

    /// Repository-relative paths of every file tracked at HEAD
    pub async fn tracked_files(&self) -> Result<BTreeSet<String>, CommandError> {
        let output =
            shell::run_quiet(&self.dir, &["git", "ls-tree", "-r", "--name-only", "HEAD"]).await?;
        Ok(output
            .stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
