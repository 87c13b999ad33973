/*!
 * Translation workflow tests against real git repositories and in-memory services
 *
 * Each test builds a bare `origin.git` in a temporary directory, clones it and
 * runs one phase with the mock platform and host.
 */

use anyhow::Result;
use std::path::Path;

use arnold::app_config::{CommandList, TranslationConfig};
use arnold::app_controller::parse_config;
use arnold::git::Git;
use arnold::providers::mock::{HostCall, MockSourceHost, MockTranslationPlatform, PlatformCall};
use arnold::providers::RepositoryRef;
use arnold::translation::pull::TRANSLATIONS_DIRECTORY;
use arnold::translation::status::{LanguageStatus, StatusNode};
use arnold::translation::{
    PULL_REQUEST_LABEL, TranslationContext, catalog, pull_translations, push_source_files, update_source_message_file,
};

use crate::common::{self, clone_origin, create_origin, origin_branches, origin_file};

const CATALOG: &str = "locale/en/LC_MESSAGES/django.po";
const GERMAN_CATALOG: &str = "locale/de/LC_MESSAGES/django.po";

const CATALOG_CONTENT: &str = "msgid \"\"\nmsgstr \"\"\n\"POT-Creation-Date: 2024-01-01 10:00+0000\\n\"\n\n#: templates/base.html:10\nmsgid \"Home\"\nmsgstr \"\"\n";

fn translation_config(extra: &str) -> TranslationConfig {
    let text = format!(
        "translation:\n  source-directories: [\"a/{{language}}/\"]\n  file-types: [\".txt\", \".po\", \".md\"]\n{}",
        extra
    );
    parse_config(&text, "test").unwrap().translation.unwrap()
}

fn repository() -> RepositoryRef {
    RepositoryRef::new("uccser", "repo")
}

fn context<'a>(
    repository: &'a RepositoryRef,
    git: &'a Git,
    config: &'a TranslationConfig,
    platform: &'a MockTranslationPlatform,
    host: &'a MockSourceHost,
    workspace: &'a Path,
) -> TranslationContext<'a> {
    TranslationContext {
        repository,
        git,
        config,
        platform,
        host,
        workspace,
    }
}

fn add_directory(path: &str, created: bool) -> PlatformCall {
    PlatformCall::AddDirectory {
        path: path.to_string(),
        created,
    }
}

fn add_file(path: &str, created: bool) -> PlatformCall {
    PlatformCall::AddFile {
        path: path.to_string(),
        created,
    }
}

/// Test upload order: parents first, then per directory its subdirectories, then its files
#[tokio::test]
async fn test_pushSourceFiles_shouldCreateDirectoriesBeforeFilesInWalkOrder() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(
        root.path(),
        &[
            ("README.md", "# Repo"),
            ("a/en/x.txt", "x"),
            ("a/en/y.po", "msgid \"y\""),
            ("a/en/skip.bin", "binary"),
            ("a/en/sub/z.txt", "z"),
        ],
    )?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let config = translation_config("");
    let platform = MockTranslationPlatform::new();
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let summary = push_source_files(&context).await?;

    assert_eq!(
        platform.calls(),
        vec![
            add_directory("a", true),
            add_directory("a/en", true),
            add_directory("a/en/sub", true),
            add_file("a/en/x.txt", true),
            add_file("a/en/y.po", true),
            add_file("a/en/sub/z.txt", true),
        ]
    );
    assert_eq!((summary.directories, summary.created, summary.updated), (3, 3, 0));
    assert_eq!(platform.upload("a/en/sub/z.txt").unwrap().export_pattern, "/a/%osx_locale%/sub/z.txt");
    Ok(())
}

/// Test that pushing the same tree again updates files instead of failing
#[tokio::test]
async fn test_pushSourceFiles_runTwice_shouldUpdateExistingFiles() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("a/en/x.txt", "x")])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let config = translation_config("");
    let platform = MockTranslationPlatform::new();
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    push_source_files(&context).await?;
    let summary = push_source_files(&context).await?;

    assert_eq!((summary.directories, summary.created, summary.updated), (2, 0, 1));
    let calls = platform.calls();
    assert_eq!(
        calls[3..].to_vec(),
        vec![
            add_directory("a", false),
            add_directory("a/en", false),
            add_file("a/en/x.txt", false),
            PlatformCall::UpdateFile {
                path: "a/en/x.txt".to_string(),
            },
        ]
    );
    Ok(())
}

/// Test that a missing source directory is skipped
#[tokio::test]
async fn test_pushSourceFiles_withMissingSourceDirectory_shouldSkip() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("README.md", "# Repo")])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let config = translation_config("");
    let platform = MockTranslationPlatform::new();
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let summary = push_source_files(&context).await?;

    assert_eq!(summary.directories + summary.created + summary.updated, 0);
    assert!(platform.calls().is_empty());
    Ok(())
}

/// Test the triviality filter against real staged content
#[tokio::test]
async fn test_unstageIfTrivial_withOnlyDateChange_shouldUnstage() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[(CATALOG, CATALOG_CONTENT)])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;

    let regenerated = CATALOG_CONTENT
        .replace("2024-01-01", "2024-03-03")
        .replace("base.html:10", "base.html:11");
    common::create_test_file(git.dir(), CATALOG, &regenerated)?;
    git.add(&[CATALOG]).await?;

    assert!(catalog::unstage_if_trivial(&git, CATALOG).await?);
    assert!(!git.has_staged_changes().await?);

    let changed = format!("{}\nmsgid \"About\"\nmsgstr \"\"\n", CATALOG_CONTENT);
    common::create_test_file(git.dir(), CATALOG, &changed)?;
    git.add(&[CATALOG]).await?;

    assert!(!catalog::unstage_if_trivial(&git, CATALOG).await?);
    assert!(git.has_staged_changes().await?);
    Ok(())
}

fn messages_config(regenerated: &Path) -> TranslationConfig {
    let mut config = translation_config(&format!("  django-message-file: {}\n", CATALOG));
    config.commands.makemessages = CommandList::One(vec![
        "cp".to_string(),
        regenerated.to_string_lossy().to_string(),
        CATALOG.to_string(),
    ]);
    config
}

/// Test that a catalog with only trivial changes is neither pushed nor proposed
#[tokio::test]
async fn test_updateSourceMessageFile_withTrivialChanges_shouldNotPush() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[(CATALOG, CATALOG_CONTENT)])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let regenerated = common::create_test_file(
        root.path(),
        "regenerated.po",
        &CATALOG_CONTENT.replace("2024-01-01", "2024-05-05"),
    )?;
    let config = messages_config(&regenerated);
    let platform = MockTranslationPlatform::new();
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let outcome = update_source_message_file(&context).await?;

    assert_eq!(outcome.unstaged, 1);
    assert!(!outcome.pushed);
    assert!(outcome.pull_request.is_none());
    assert_eq!(origin_branches(&origin)?, vec!["develop"]);
    assert!(host.calls().is_empty());
    Ok(())
}

/// Test that a new message is pushed and proposed as a labelled pull request
#[tokio::test]
async fn test_updateSourceMessageFile_withNewMessage_shouldOpenPullRequest() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[(CATALOG, CATALOG_CONTENT)])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let regenerated = common::create_test_file(
        root.path(),
        "regenerated.po",
        &format!("{}\nmsgid \"About\"\nmsgstr \"\"\n", CATALOG_CONTENT),
    )?;
    let config = messages_config(&regenerated);
    let platform = MockTranslationPlatform::new();
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let outcome = update_source_message_file(&context).await?;

    assert!(outcome.pushed);
    assert_eq!(outcome.pull_request, Some(1));
    assert!(origin_file(&origin, "translation-update-messages", CATALOG)?.contains("msgid \"About\""));

    let calls = host.calls();
    match &calls[0] {
        HostCall::CreatePull(pull) => {
            assert_eq!(pull.head, "translation-update-messages");
            assert_eq!(pull.base, "develop");
            assert_eq!(pull.title, "Update source language message file");
            assert!(pull.body.contains(CATALOG));
        }
        other => panic!("expected CreatePull, got {:?}", other),
    }
    assert_eq!(
        calls[1],
        HostCall::AddLabels {
            number: 1,
            labels: vec![PULL_REQUEST_LABEL.to_string()],
        }
    );
    Ok(())
}

/// Test that an already open pull request is not duplicated
#[tokio::test]
async fn test_updateSourceMessageFile_withOpenPullRequest_shouldOnlyPush() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[(CATALOG, CATALOG_CONTENT)])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let regenerated = common::create_test_file(
        root.path(),
        "regenerated.po",
        &format!("{}\nmsgid \"Contact\"\nmsgstr \"\"\n", CATALOG_CONTENT),
    )?;
    let config = messages_config(&regenerated);
    let platform = MockTranslationPlatform::new();
    let host = MockSourceHost::new().with_pull("translation-update-messages", "develop");
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let outcome = update_source_message_file(&context).await?;

    assert!(outcome.pushed);
    assert!(outcome.pull_request.is_none());
    assert!(host.calls().is_empty());
    Ok(())
}

fn german_status() -> LanguageStatus {
    LanguageStatus {
        files: vec![
            StatusNode::directory(
                "a",
                vec![StatusNode::directory(
                    "en",
                    vec![
                        StatusNode::file("index.md", 10, 10),
                        StatusNode::file("missing.md", 4, 4),
                        StatusNode::file("draft.md", 10, 2),
                    ],
                )],
            ),
            StatusNode::directory(
                "locale",
                vec![StatusNode::directory(
                    "en",
                    vec![StatusNode::directory("LC_MESSAGES", vec![StatusNode::file("django.po", 50, 1)])],
                )],
            ),
        ],
    }
}

fn chinese_status() -> LanguageStatus {
    LanguageStatus {
        files: vec![StatusNode::directory(
            "a",
            vec![StatusNode::directory("en", vec![StatusNode::file("index.md", 10, 10)])],
        )],
    }
}

/// Test pulling approved translations into one branch and pull request per language
#[tokio::test]
async fn test_pullTranslations_shouldOpenOnePullRequestPerActiveLanguage() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let german_catalog = CATALOG_CONTENT.replace("msgstr \"\"\n", "msgstr \"Startseite\"\n");
    let origin = create_origin(
        root.path(),
        &[
            ("a/en/index.md", "# Hello"),
            ("a/en/structure.yaml", "title: Docs\n"),
            (GERMAN_CATALOG, german_catalog.as_str()),
        ],
    )?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let config = translation_config("  file-overrides: [\"a/{language}/structure.yaml\"]\n");
    let platform = MockTranslationPlatform::new()
        .with_supported_language("de", "de")
        .with_supported_language("zh-CN", "zh-Hans")
        .with_language("de", 60, german_status())
        .with_language("fr", 0, LanguageStatus::default())
        .with_language("zh-CN", 10, chinese_status())
        .with_archive_file("a/de/index.md", "# Hallo")
        .with_archive_file(GERMAN_CATALOG, &german_catalog.replace("2024-01-01", "2024-06-06"))
        .with_archive_file("a/zh-Hans/index.md", "# Ni hao");
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let outcomes = pull_translations(&context).await?;

    assert_eq!(outcomes.len(), 2);
    let german = &outcomes[0];
    assert_eq!(german.code, "de");
    assert_eq!((german.copied, german.missing, german.unstaged), (2, 1, 1));
    assert!(german.pushed);
    assert_eq!(german.pull_request, Some(1));
    let chinese = &outcomes[1];
    assert_eq!(chinese.code, "zh-CN");
    assert_eq!(chinese.pull_request, Some(2));

    assert_eq!(origin_file(&origin, "translation-de", "a/de/index.md")?, "# Hallo");
    assert!(origin_file(&origin, "translation-de", "a/de/structure.yaml")?.contains("translation-override: true"));
    // The trivially changed catalog stays at its committed version
    assert_eq!(origin_file(&origin, "translation-de", GERMAN_CATALOG)?, german_catalog);
    assert_eq!(origin_file(&origin, "translation-zh-CN", "a/zh_Hans/index.md")?, "# Ni hao");
    assert!(!origin_branches(&origin)?.contains(&"translation-fr".to_string()));

    let titles: Vec<String> = host
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            HostCall::CreatePull(pull) => Some(pull.title),
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["Update German translations", "Update Chinese translations"]);

    assert!(platform.calls().contains(&PlatformCall::Download));
    assert!(!workspace.join(TRANSLATIONS_DIRECTORY).exists());
    Ok(())
}

/// Test that nothing is downloaded when no language has approved words
#[tokio::test]
async fn test_pullTranslations_withNoActiveLanguages_shouldNotDownload() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("a/en/index.md", "# Hello")])?;
    let workspace = root.path().join("projects");
    let git = clone_origin(&origin, &workspace, "repo").await?;
    let config = translation_config("");
    let platform = MockTranslationPlatform::new().with_language("fr", 0, LanguageStatus::default());
    let host = MockSourceHost::new();
    let repository = repository();
    let context = context(&repository, &git, &config, &platform, &host, &workspace);

    let outcomes = pull_translations(&context).await?;

    assert!(outcomes.is_empty());
    assert!(platform.calls().is_empty());
    Ok(())
}
