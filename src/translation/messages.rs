use log::info;

use crate::errors::AppError;
use crate::shell;
use crate::templates::{Context, Template};
use crate::translation::{TranslationContext, branch_name, catalog, commit_and_push, ensure_pull_request};

/// Suffix of the branch holding regenerated source catalogs
pub const UPDATE_MESSAGES_SUFFIX: &str = "update-messages";

/// Commit message used for regenerated source catalogs
pub const UPDATE_MESSAGES_COMMIT: &str = "Update source language message file (django.po)";

/// What the message file regeneration did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagesOutcome {
    /// Catalogs unstaged by the triviality filter
    pub unstaged: usize,
    /// Whether a commit was pushed
    pub pushed: bool,
    /// Pull request opened in this run
    pub pull_request: Option<u64>,
}

/// Regenerate the source message catalogs and propose them as a pull request
pub async fn update_source_message_file(context: &TranslationContext<'_>) -> Result<MessagesOutcome, AppError> {
    let result = regenerate(context).await;
    context.git.reset_and_clean().await?;
    result
}

async fn regenerate(context: &TranslationContext<'_>) -> Result<MessagesOutcome, AppError> {
    let git = context.git;
    let config = context.config;
    let target = &config.branches.update_messages_target;
    let branch = branch_name(UPDATE_MESSAGES_SUFFIX);
    let mut outcome = MessagesOutcome::default();

    git.checkout_branch(&branch).await?;
    git.merge(&format!("origin/{}", target)).await?;

    let commands = &config.commands;
    shell::run_all(context.directory(), &commands.start.commands()).await?;
    shell::run_all(context.directory(), &commands.makemessages.commands()).await?;
    shell::run_all(context.directory(), &commands.end.commands()).await?;

    let message_files = config.message_files();
    if message_files.is_empty() {
        info!("No source message files configured");
        return Ok(outcome);
    }

    git.add(&message_files).await?;
    let tracked = git.tracked_files().await?;
    for path in &message_files {
        // New catalogs have nothing to compare against and always stay staged
        if tracked.contains(path) && catalog::unstage_if_trivial(git, path).await? {
            outcome.unstaged += 1;
        }
    }

    outcome.pushed = commit_and_push(git, UPDATE_MESSAGES_COMMIT, &branch).await?;
    if outcome.pushed {
        info!("Changes to source message file pushed.");
        let mut values = Context::new();
        values.insert(
            "message_files",
            message_files
                .iter()
                .map(|path| format!("- `{}`", path))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        outcome.pull_request = ensure_pull_request(
            context,
            &branch,
            target,
            Template::new(Template::UPDATE_MESSAGES_PR_TITLE).render_line(&values),
            Template::new(Template::UPDATE_MESSAGES_PR_BODY).render(&values),
        )
        .await?;
    } else {
        info!("No changes to source message file to push.");
    }

    Ok(outcome)
}
