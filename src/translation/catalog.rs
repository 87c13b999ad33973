use log::info;
use std::collections::BTreeSet;

use crate::errors::CommandError;
use crate::git::Git;

// @module: Message catalog triviality filter

/// Line prefixes that regeneration changes without any translator-visible effect
pub const TRIVIAL_LINE_PREFIXES: &[&str] = &["\"POT-Creation-Date:", "\"PO-Revision-Date:", "#: "];

/// Lines of `current` that do not appear anywhere in `previous`
///
/// Comparison is by set, so moved lines are not reported.
pub fn added_lines<'a>(previous: &str, current: &'a str) -> BTreeSet<&'a str> {
    let previous: BTreeSet<&str> = previous.split('\n').collect();
    current.split('\n').filter(|line| !previous.contains(line)).collect()
}

/// Whether `current` only differs from `previous` by trivial lines
///
/// No added lines at all also counts as trivial.
pub fn is_trivial_change(previous: &str, current: &str) -> bool {
    added_lines(previous, current)
        .iter()
        .all(|line| TRIVIAL_LINE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
}

/// Unstage `path` when its staged content only has trivial changes
///
/// `path` must exist at HEAD. Returns whether the file was unstaged.
pub async fn unstage_if_trivial(git: &Git, path: &str) -> Result<bool, CommandError> {
    let previous = git.show_committed(path).await?;
    let current = git.show_staged(path).await?;

    if is_trivial_change(&previous, &current) {
        info!("Message file '{}' only has trivial changes, unstaging file...", path);
        git.unstage(path).await?;
        return Ok(true);
    }
    Ok(false)
}
