/*!
 * Full controller runs against local repositories and in-memory services
 */

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use arnold::app_config::{Secrets, Settings};
use arnold::app_controller::{Controller, RepositoryOutcome};
use arnold::link_checker::{UrlCheck, UrlChecker};
use arnold::providers::mock::{HostCall, MockSourceHost, MockTranslationPlatform, PlatformCall};
use arnold::providers::{SourceHost, TranslationPlatform};

use crate::common::{self, create_origin};

/// Treats every URL containing "broken" as a 404
#[derive(Debug)]
struct FakeUrlChecker;

#[async_trait]
impl UrlChecker for FakeUrlChecker {
    async fn check(&self, url: &str) -> UrlCheck {
        if url.contains("broken") {
            UrlCheck {
                broken: true,
                status: Some(404),
                message: "Not Found".to_string(),
            }
        } else {
            UrlCheck {
                broken: false,
                status: Some(200),
                message: "OK".to_string(),
            }
        }
    }
}

fn settings(projects_dir: &Path) -> Settings {
    Settings {
        projects_dir: projects_dir.to_path_buf(),
        ..Default::default()
    }
}

fn controller(settings: Settings, secrets: Secrets, host: &Arc<MockSourceHost>, platform: &Arc<MockTranslationPlatform>) -> Controller {
    let host: Arc<dyn SourceHost> = host.clone();
    let platform = platform.clone();
    Controller::new(settings, secrets, host)
        .with_platform_factory(Box::new(move |_: &str, _: &str| -> Arc<dyn TranslationPlatform> {
            platform.clone()
        }))
        .with_url_checker(Box::new(FakeUrlChecker))
}

/// Test that repositories without a config file are left alone
#[tokio::test]
async fn test_run_withoutConfigFile_shouldNotClone() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let projects = root.path().join("projects");
    let host = Arc::new(MockSourceHost::new().with_repository("plain", None));
    let platform = Arc::new(MockTranslationPlatform::new());

    let outcomes = controller(settings(&projects), Secrets::default(), &host, &platform)
        .run()
        .await?;

    assert_eq!(outcomes, vec![("plain".to_string(), RepositoryOutcome::NotConfigured)]);
    assert!(!projects.join("plain").exists());
    Ok(())
}

/// Test that an invalid config file skips the repository without failing the run
#[tokio::test]
async fn test_run_withInvalidConfig_shouldSkipRepository() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let projects = root.path().join("projects");
    let host = Arc::new(
        MockSourceHost::new()
            .with_repository("broken-yaml", Some("translation: [unclosed"))
            .with_repository("no-placeholder", Some("translation:\n  source-directories: [docs]\n  file-types: [.md]\n")),
    );
    let platform = Arc::new(MockTranslationPlatform::new());

    let outcomes = controller(settings(&projects), Secrets::default(), &host, &platform)
        .run()
        .await?;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|(_, outcome)| matches!(outcome, RepositoryOutcome::InvalidConfig(_))));
    assert!(!projects.join("broken-yaml").exists());
    Ok(())
}

/// Test a link check run that files an issue for the broken URL
#[tokio::test]
async fn test_run_withLinkChecker_shouldFileIssueForBrokenLinks() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(
        root.path(),
        &[
            ("README.md", "See https://ok.example/ and https://broken.example/page."),
            ("logo.png", "https://broken.example/ignored"),
        ],
    )?;
    let projects = root.path().join("projects");
    let host = Arc::new(MockSourceHost::new().with_repository_at(
        "website",
        &origin.to_string_lossy(),
        Some("broken-link-checker: true"),
    ));
    let platform = Arc::new(MockTranslationPlatform::new());

    let outcomes = controller(settings(&projects), Secrets::default(), &host, &platform)
        .run()
        .await?;

    assert_eq!(outcomes, vec![("website".to_string(), RepositoryOutcome::Processed)]);
    assert!(projects.join("website").join("README.md").exists());
    let calls = host.calls();
    match &calls[0] {
        HostCall::CreateIssue { title, body } => {
            assert_eq!(title, "Found 1 broken link in 1 scanned files");
            assert!(body.contains("https://broken.example/page"));
            assert!(!body.contains("https://ok.example/"));
        }
        other => panic!("expected CreateIssue, got {:?}", other),
    }
    assert!(platform.calls().is_empty());
    Ok(())
}

/// Test that the link checker can be switched off for a run
#[tokio::test]
async fn test_run_withSkipLinkChecker_shouldNotTouchIssues() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("README.md", "https://broken.example/")])?;
    let projects = root.path().join("projects");
    let host = Arc::new(MockSourceHost::new().with_repository_at(
        "website",
        &origin.to_string_lossy(),
        Some("broken-link-checker: true"),
    ));
    let platform = Arc::new(MockTranslationPlatform::new());
    let settings = Settings {
        skip_link_checker: true,
        ..settings(&projects)
    };

    controller(settings, Secrets::default(), &host, &platform).run().await?;

    assert!(host.calls().is_empty());
    Ok(())
}

/// Test a full translation run: messages, push, build and pull in order
#[tokio::test]
async fn test_run_withTranslation_shouldPushAndBuild() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("docs/en/index.md", "# Hello")])?;
    let projects = root.path().join("projects");
    let config = "translation:\n  source-directories: [\"docs/{language}\"]\n  file-types: [.md]\n";
    let host = Arc::new(MockSourceHost::new().with_repository_at("cs-docs", &origin.to_string_lossy(), Some(config)));
    let platform = Arc::new(MockTranslationPlatform::new());
    let secrets = Secrets::from_pairs([("CSDOCS_CROWDIN_API_KEY", "key")]);

    let outcomes = controller(settings(&projects), secrets, &host, &platform).run().await?;

    assert_eq!(outcomes, vec![("cs-docs".to_string(), RepositoryOutcome::Processed)]);
    assert_eq!(
        platform.calls(),
        vec![
            PlatformCall::AddDirectory {
                path: "docs".to_string(),
                created: true,
            },
            PlatformCall::AddDirectory {
                path: "docs/en".to_string(),
                created: true,
            },
            PlatformCall::AddFile {
                path: "docs/en/index.md".to_string(),
                created: true,
            },
            PlatformCall::Export,
        ]
    );
    Ok(())
}

/// Test that a translated repository without its Crowdin key fails with the key name
#[tokio::test]
async fn test_run_withMissingCrowdinKey_shouldFailNamingTheSecret() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("docs/en/index.md", "# Hello")])?;
    let projects = root.path().join("projects");
    let config = "translation:\n  source-directories: [\"docs/{language}\"]\n  file-types: [.md]\n";
    let host = Arc::new(MockSourceHost::new().with_repository_at("cs-docs", &origin.to_string_lossy(), Some(config)));
    let platform = Arc::new(MockTranslationPlatform::new());

    let error = controller(settings(&projects), Secrets::default(), &host, &platform)
        .run()
        .await
        .unwrap_err();

    assert!(format!("{:#}", error).contains("CSDOCS_CROWDIN_API_KEY"));
    assert!(platform.calls().is_empty());
    Ok(())
}

/// Test reusing an existing clone
#[tokio::test]
async fn test_run_withSkipClone_shouldReuseExistingClone() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("README.md", "https://ok.example/")])?;
    let projects = root.path().join("projects");
    let host = Arc::new(MockSourceHost::new().with_repository_at(
        "website",
        &origin.to_string_lossy(),
        Some("broken-link-checker: true"),
    ));
    let platform = Arc::new(MockTranslationPlatform::new());

    controller(settings(&projects), Secrets::default(), &host, &platform).run().await?;
    let marker = projects.join("website").join("local-only.txt");
    std::fs::write(&marker, "kept")?;

    let reuse = Settings {
        skip_clone: true,
        ..settings(&projects)
    };
    let outcomes = controller(reuse, Secrets::default(), &host, &platform).run().await?;

    assert_eq!(outcomes, vec![("website".to_string(), RepositoryOutcome::Processed)]);
    assert!(marker.exists());
    Ok(())
}

/// Test that reusing a clone that does not exist is an error
#[tokio::test]
async fn test_run_withSkipCloneAndNoClone_shouldFail() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let origin = create_origin(root.path(), &[("README.md", "# Repo")])?;
    let projects = root.path().join("projects");
    let host = Arc::new(MockSourceHost::new().with_repository_at(
        "website",
        &origin.to_string_lossy(),
        Some("broken-link-checker: true"),
    ));
    let platform = Arc::new(MockTranslationPlatform::new());
    let reuse = Settings {
        skip_clone: true,
        ..settings(&projects)
    };

    assert!(controller(reuse, Secrets::default(), &host, &platform).run().await.is_err());
    Ok(())
}

/// Test selecting a single repository that does not exist
#[tokio::test]
async fn test_run_withUnknownRepository_shouldFail() -> Result<()> {
    common::init_logger();
    let root = tempfile::tempdir()?;
    let host = Arc::new(MockSourceHost::new().with_repository("website", None));
    let platform = Arc::new(MockTranslationPlatform::new());
    let selected = Settings {
        repository: Some("missing".to_string()),
        ..settings(&root.path().join("projects"))
    };

    let error = controller(selected, Secrets::default(), &host, &platform)
        .run()
        .await
        .unwrap_err();

    assert!(error.to_string().contains("uccser/missing"));
    Ok(())
}
