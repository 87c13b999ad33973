/*!
 * Common test utilities for the arnold test suite
 */

use anyhow::{Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use arnold::git::Git;

/// Route log output through the test harness
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Run git synchronously in `dir`, failing on a non-zero exit
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        return Err(anyhow!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Creates a test file with the given content, creating parent directories
pub fn create_test_file(dir: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Create a bare `origin.git` under `root` whose `develop` branch holds `files`
pub fn create_origin(root: &Path, files: &[(&str, &str)]) -> Result<PathBuf> {
    let seed = root.join("seed");
    fs::create_dir_all(&seed)?;
    git(&seed, &["init", "--quiet", "--initial-branch", "develop"])?;
    git(&seed, &["config", "user.name", "Test"])?;
    git(&seed, &["config", "user.email", "test@example.com"])?;
    for (path, content) in files {
        create_test_file(&seed, path, content)?;
    }
    git(&seed, &["add", "-A"])?;
    git(&seed, &["commit", "--quiet", "--allow-empty", "-m", "Initial commit"])?;

    let origin = root.join("origin.git");
    let origin_arg = origin.to_string_lossy().to_string();
    git(root, &["clone", "--quiet", "--bare", "seed", origin_arg.as_str()])?;
    Ok(origin)
}

/// Clone `origin` into `parent/name` with a committer identity set
pub async fn clone_origin(origin: &Path, parent: &Path, name: &str) -> Result<Git> {
    fs::create_dir_all(parent)?;
    let git = Git::clone_into(parent, &origin.to_string_lossy(), name).await?;
    git.set_identity("Test", "test@example.com").await?;
    Ok(git)
}

/// Branches that exist in the bare repository
pub fn origin_branches(origin: &Path) -> Result<Vec<String>> {
    let output = git(origin, &["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
    Ok(output.lines().map(str::to_string).collect())
}

/// Content of `path` on `branch` of the bare repository
pub fn origin_file(origin: &Path, branch: &str, path: &str) -> Result<String> {
    git(origin, &["show", &format!("{}:{}", branch, path)])
}
