/*!
 * Tests for the source upload helpers against the in-memory platform
 */

use std::collections::BTreeSet;
use std::path::PathBuf;

use arnold::errors::PlatformError;
use arnold::providers::FileUpload;
use arnold::providers::mock::{MockTranslationPlatform, PlatformCall};
use arnold::translation::push::{UploadOutcome, ensure_directory, export_pattern, upload_file};

fn upload(path: &str) -> FileUpload {
    FileUpload {
        remote_path: path.to_string(),
        export_pattern: export_pattern(path),
        local_path: PathBuf::from(path),
    }
}

/// Test that an existing directory is not an error
#[tokio::test]
async fn test_ensureDirectory_withExistingDirectory_shouldSucceed() {
    let platform = MockTranslationPlatform::new().with_existing_directory("docs");
    let mut known = BTreeSet::new();

    assert!(ensure_directory(&platform, "docs", &mut known).await.unwrap());
    assert_eq!(
        platform.calls(),
        vec![PlatformCall::AddDirectory {
            path: "docs".to_string(),
            created: false,
        }]
    );
}

/// Test that a directory is only requested once per run
#[tokio::test]
async fn test_ensureDirectory_calledTwice_shouldOnlyCallPlatformOnce() {
    let platform = MockTranslationPlatform::new();
    let mut known = BTreeSet::new();

    assert!(ensure_directory(&platform, "docs/en", &mut known).await.unwrap());
    assert!(!ensure_directory(&platform, "docs/en", &mut known).await.unwrap());
    assert_eq!(platform.calls().len(), 1);
}

/// Test that a second run over the same tree hits the "already exists" answer without failing
#[tokio::test]
async fn test_ensureDirectory_acrossRuns_shouldBeIdempotent() {
    let platform = MockTranslationPlatform::new();

    let mut first_run = BTreeSet::new();
    ensure_directory(&platform, "docs", &mut first_run).await.unwrap();
    let mut second_run = BTreeSet::new();
    ensure_directory(&platform, "docs", &mut second_run).await.unwrap();

    assert_eq!(
        platform.calls(),
        vec![
            PlatformCall::AddDirectory {
                path: "docs".to_string(),
                created: true,
            },
            PlatformCall::AddDirectory {
                path: "docs".to_string(),
                created: false,
            },
        ]
    );
}

/// Test creating a new file
#[tokio::test]
async fn test_uploadFile_withNewFile_shouldCreate() {
    let platform = MockTranslationPlatform::new();

    let outcome = upload_file(&platform, &upload("docs/en/index.md")).await.unwrap();

    assert_eq!(outcome, UploadOutcome::Created);
    let stored = platform.upload("docs/en/index.md").unwrap();
    assert_eq!(stored.export_pattern, "/docs/%osx_locale%/index.md");
}

/// Test the update retry for files that already exist
#[tokio::test]
async fn test_uploadFile_withExistingFile_shouldRetryAsUpdate() {
    let platform = MockTranslationPlatform::new().with_existing_file("docs/en/index.md");

    let outcome = upload_file(&platform, &upload("docs/en/index.md")).await.unwrap();

    assert_eq!(outcome, UploadOutcome::Updated);
    assert_eq!(
        platform.calls(),
        vec![
            PlatformCall::AddFile {
                path: "docs/en/index.md".to_string(),
                created: false,
            },
            PlatformCall::UpdateFile {
                path: "docs/en/index.md".to_string(),
            },
        ]
    );
}

/// Test that other failures are not retried
#[tokio::test]
async fn test_uploadFile_withServerError_shouldFailWithoutRetry() {
    let platform = MockTranslationPlatform::new().with_failing_file("docs/en/index.md");

    let result = upload_file(&platform, &upload("docs/en/index.md")).await;

    assert!(matches!(result, Err(PlatformError::Http { status: 500, .. })));
    assert!(platform.calls().is_empty());
}
