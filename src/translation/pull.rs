/*!
 * Pull approved translations back into the repository.
 *
 * The translation archive is downloaded once per run. Each language with
 * approved words then gets its own branch, built on a clean working tree
 * and reset afterwards so nothing leaks into the next language.
 */

use log::{debug, info, warn};
use std::path::Path;

use crate::app_config::{LANGUAGE_PLACEHOLDER, SOURCE_LANGUAGE};
use crate::errors::{AppError, PlatformError};
use crate::file_utils::{self, FileManager, OVERRIDE_FRONT_MATTER_LINE};
use crate::language_utils::{self, LanguageMap, LanguageMapping};
use crate::providers::TranslationPlatform;
use crate::templates::{Context, Template};
use crate::translation::status::{MESSAGE_FILE_EXTENSION, approved_files};
use crate::translation::{TranslationContext, branch_name, catalog, commit_and_push, ensure_pull_request};

/// Directory (inside the workspace) the translation archive is extracted to
pub const TRANSLATIONS_DIRECTORY: &str = "project-translations";

/// Result of processing one language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageOutcome {
    /// Platform language code
    pub code: String,
    /// Files copied from the archive
    pub copied: usize,
    /// Approved files missing from the archive
    pub missing: usize,
    /// Catalogs unstaged by the triviality filter
    pub unstaged: usize,
    /// Whether a commit was pushed
    pub pushed: bool,
    /// Pull request opened in this run
    pub pull_request: Option<u64>,
}

/// Codes of project languages with at least one approved word
pub async fn project_languages(platform: &dyn TranslationPlatform) -> Result<Vec<String>, PlatformError> {
    Ok(platform
        .project_status()
        .await?
        .into_iter()
        .filter(|language| language.words_approved > 0)
        .map(|language| language.code)
        .collect())
}

/// Pull approved translations for every active language
pub async fn pull_translations(context: &TranslationContext<'_>) -> Result<Vec<LanguageOutcome>, AppError> {
    let supported = context.platform.supported_languages().await?;
    let mapping = LanguageMap::from_supported(&supported, &context.config.language_mapping_overrides);
    debug!("Loaded {} language mappings", mapping.len());

    let languages = project_languages(context.platform).await?;
    if languages.is_empty() {
        info!("No languages with approved translations");
        return Ok(Vec::new());
    }

    let extract_location = context.workspace.join(TRANSLATIONS_DIRECTORY);
    FileManager::remove_dir(&extract_location).map_err(|e| AppError::File(e.to_string()))?;
    context.platform.download_translations(&extract_location).await?;

    let mut outcomes = Vec::with_capacity(languages.len());
    for code in languages {
        info!("Processing '{}' language...", code);
        let language = mapping.resolve(&code);
        let result = pull_language(context, &extract_location, &language).await;
        // Always leave a clean tree for the next language
        context.git.reset_and_clean().await?;
        outcomes.push(result?);
    }

    FileManager::remove_dir(&extract_location).map_err(|e| AppError::File(e.to_string()))?;
    Ok(outcomes)
}

async fn pull_language(
    context: &TranslationContext<'_>,
    extract_location: &Path,
    language: &LanguageMapping,
) -> Result<LanguageOutcome, AppError> {
    let git = context.git;
    let target = &context.config.branches.translation_target;
    let branch = branch_name(&language.crowdin_code);
    let mut outcome = LanguageOutcome {
        code: language.crowdin_code.clone(),
        ..Default::default()
    };

    git.checkout_branch(target).await?;
    git.checkout_branch(&branch).await?;
    git.merge(&format!("origin/{}", target)).await?;

    let status = context.platform.language_status(&language.crowdin_code).await?;
    for approved in approved_files(&status) {
        let archive_path = file_utils::rewrite_locale_segment(&approved, SOURCE_LANGUAGE, &language.platform_locale);
        let repository_path = file_utils::rewrite_locale_segment(&approved, SOURCE_LANGUAGE, &language.destination_code);
        let source = file_utils::resolve(extract_location, &archive_path);
        if !FileManager::file_exists(&source) {
            warn!("'{}' is not in the translation archive, skipping", archive_path);
            outcome.missing += 1;
            continue;
        }
        FileManager::copy_file(&source, file_utils::resolve(context.directory(), &repository_path))
            .map_err(|e| AppError::File(e.to_string()))?;
        debug!("Copied {}", repository_path);
        outcome.copied += 1;
    }

    apply_file_overrides(context, language)?;

    git.add_all().await?;
    let tracked = git.tracked_files().await?;
    let catalogs = FileManager::find_files(context.directory(), MESSAGE_FILE_EXTENSION)
        .map_err(|e| AppError::File(e.to_string()))?;
    for path in catalogs
        .iter()
        .filter(|path| file_utils::has_segment(path, &language.destination_code))
        .filter(|path| tracked.contains(path.as_str()))
    {
        if catalog::unstage_if_trivial(git, path).await? {
            outcome.unstaged += 1;
        }
    }

    let message = format!("Update '{}' language translations", language.crowdin_code);
    outcome.pushed = commit_and_push(git, &message, &branch).await?;
    if outcome.pushed {
        info!("Changes to '{}' language pushed.", language.crowdin_code);
        let context_values = pull_request_context(language);
        outcome.pull_request = ensure_pull_request(
            context,
            &branch,
            target,
            Template::new(Template::TRANSLATION_PR_TITLE).render_line(&context_values),
            Template::new(Template::TRANSLATION_PR_BODY).render(&context_values),
        )
        .await?;
    } else {
        info!("No changes to '{}' translation to push.", language.crowdin_code);
    }

    Ok(outcome)
}

/// Copy override files from the source locale, marking them in their front matter
fn apply_file_overrides(context: &TranslationContext<'_>, language: &LanguageMapping) -> Result<(), AppError> {
    for template in &context.config.file_overrides {
        let source_path = template.replace(LANGUAGE_PLACEHOLDER, SOURCE_LANGUAGE);
        let destination_path = template.replace(LANGUAGE_PLACEHOLDER, &language.destination_code);
        let source = file_utils::resolve(context.directory(), &source_path);
        if !FileManager::file_exists(&source) {
            warn!("Override source '{}' does not exist, skipping", source_path);
            continue;
        }

        let content = FileManager::read_to_string(&source).map_err(|e| AppError::File(e.to_string()))?;
        let content = file_utils::inject_front_matter(&content, OVERRIDE_FRONT_MATTER_LINE).unwrap_or(content);
        FileManager::write_to_file(file_utils::resolve(context.directory(), &destination_path), &content)
            .map_err(|e| AppError::File(e.to_string()))?;
        debug!("Override {} -> {}", source_path, destination_path);
    }
    Ok(())
}

fn pull_request_context(language: &LanguageMapping) -> Context {
    let mut context = Context::new();
    context.insert("language_code", language.crowdin_code.clone());
    context.insert("language_name", language_utils::display_name(&language.crowdin_code));
    context.insert("destination_code", language.destination_code.clone());
    context
}
