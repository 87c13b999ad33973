use log::{info, warn};
use std::collections::BTreeSet;

use crate::app_config::SOURCE_LANGUAGE;
use crate::errors::{AppError, PlatformError};
use crate::file_utils::{self, FileManager};
use crate::providers::{FileUpload, TranslationPlatform};
use crate::translation::TranslationContext;

/// Locale placeholder the platform substitutes in export patterns
pub const EXPORT_LOCALE_PLACEHOLDER: &str = "%osx_locale%";

/// What happened to one uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// `add-file` succeeded
    Created,
    /// The file existed and was replaced with `update-file`
    Updated,
}

/// Counts reported after pushing a repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    pub directories: usize,
    pub created: usize,
    pub updated: usize,
}

/// Export pattern for a source file path
///
/// The source locale segment becomes `%osx_locale%` and the result always
/// starts with `/`.
pub fn export_pattern(path: &str) -> String {
    let pattern = file_utils::rewrite_locale_segment(path, SOURCE_LANGUAGE, EXPORT_LOCALE_PLACEHOLDER);
    if pattern.starts_with('/') {
        pattern
    } else {
        format!("/{}", pattern)
    }
}

/// Every prefix of a `/`-separated directory path, shortest first
pub fn directory_segments(directory: &str) -> Vec<String> {
    let parts: Vec<&str> = directory.split('/').filter(|p| !p.is_empty()).collect();
    (1..=parts.len()).map(|i| parts[..i].join("/")).collect()
}

/// Create a directory on the platform unless it was seen before
///
/// An "already exists" answer counts as success. Returns whether a call was made.
pub async fn ensure_directory(
    platform: &dyn TranslationPlatform,
    path: &str,
    known: &mut BTreeSet<String>,
) -> Result<bool, PlatformError> {
    if !known.insert(path.to_string()) {
        return Ok(false);
    }
    match platform.add_directory(path).await {
        Ok(()) => info!("{} - Directory created on Crowdin.", path),
        Err(e) if e.is_directory_exists() => info!("{} - {}", path, e),
        Err(e) => return Err(e),
    }
    Ok(true)
}

/// Upload a file, retrying once as an update when it already exists
pub async fn upload_file(platform: &dyn TranslationPlatform, upload: &FileUpload) -> Result<UploadOutcome, PlatformError> {
    match platform.add_file(upload).await {
        Ok(()) => {
            info!("{} - File uploaded to Crowdin.", upload.remote_path);
            Ok(UploadOutcome::Created)
        }
        Err(e) if e.is_file_needs_update() => {
            platform.update_file(upload).await?;
            info!("{} - File updated on Crowdin.", upload.remote_path);
            Ok(UploadOutcome::Updated)
        }
        Err(e) => Err(e),
    }
}

/// Upload every allowed source file of the repository
///
/// Directories are created parents first, and within a directory its
/// subdirectories are created before its files are uploaded in name order.
pub async fn push_source_files(context: &TranslationContext<'_>) -> Result<PushSummary, AppError> {
    let git = context.git;
    let source_branch = &context.config.branches.translation_source;
    git.checkout_branch(source_branch).await?;

    let mut known = BTreeSet::new();
    let mut summary = PushSummary::default();

    for source_directory in context.config.source_directories_for(SOURCE_LANGUAGE) {
        let source_directory = source_directory.trim_end_matches('/').to_string();
        if !FileManager::dir_exists(file_utils::resolve(context.directory(), &source_directory)) {
            warn!("Source directory '{}' does not exist, skipping", source_directory);
            continue;
        }

        for segment in directory_segments(&source_directory) {
            if ensure_directory(context.platform, &segment, &mut known).await? {
                summary.directories += 1;
            }
        }

        let listings = FileManager::walk_top_down(context.directory(), &source_directory)
            .map_err(|e| AppError::File(e.to_string()))?;
        for listing in listings {
            for directory in &listing.subdirectories {
                if ensure_directory(context.platform, directory, &mut known).await? {
                    summary.directories += 1;
                }
            }

            for file in &listing.files {
                let name = file.rsplit('/').next().unwrap_or(file);
                if !context.config.allows_file(name) {
                    continue;
                }
                let upload = FileUpload {
                    remote_path: file.clone(),
                    export_pattern: export_pattern(file),
                    local_path: file_utils::resolve(context.directory(), file),
                };
                match upload_file(context.platform, &upload).await? {
                    UploadOutcome::Created => summary.created += 1,
                    UploadOutcome::Updated => summary.updated += 1,
                }
            }
        }
    }

    git.reset_and_clean().await?;
    info!(
        "Pushed source files: {} directories, {} new files, {} updated files",
        summary.directories, summary.created, summary.updated
    );
    Ok(summary)
}
