/*!
 * Tests for keeping the broken link issue in sync with link check results
 */

use std::collections::{BTreeMap, BTreeSet};

use arnold::link_checker::report::{CLOSE_COMMENT, ISSUE_LABEL, UPDATE_COMMENT, render_issue};
use arnold::link_checker::{IssueAction, LinkReport, UrlResult, reconcile_issue};
use arnold::providers::mock::{HostCall, MockSourceHost};
use arnold::providers::{IssueState, RepositoryRef};

const BOT: &str = "uccser-bot";

fn repository() -> RepositoryRef {
    RepositoryRef::new("uccser", "cs-unplugged")
}

fn report_with(broken: &[&str]) -> LinkReport {
    let mut urls = BTreeMap::new();
    for url in broken {
        urls.insert(
            url.to_string(),
            UrlResult {
                broken: true,
                status: Some(404),
                message: "Not Found".to_string(),
                locations: BTreeSet::from(["docs/index.md".to_string()]),
            },
        );
    }
    LinkReport { number_files: 3, urls }
}

/// Test that a clean report without an issue does nothing
#[tokio::test]
async fn test_reconcile_withNoIssueAndNoBrokenLinks_shouldDoNothing() {
    let host = MockSourceHost::new();
    let action = reconcile_issue(&host, &repository(), BOT, &report_with(&[])).await.unwrap();
    assert_eq!(action, IssueAction::Nothing);
    assert!(host.calls().is_empty());
}

/// Test creating and labelling a new issue
#[tokio::test]
async fn test_reconcile_withBrokenLinksAndNoIssue_shouldCreateLabelledIssue() {
    let host = MockSourceHost::new();
    let report = report_with(&["https://gone.example/"]);

    let action = reconcile_issue(&host, &repository(), BOT, &report).await.unwrap();

    assert_eq!(action, IssueAction::Created(1));
    let rendered = render_issue(&report);
    assert_eq!(
        host.calls(),
        vec![
            HostCall::CreateIssue {
                title: rendered.title.clone(),
                body: rendered.body.clone(),
            },
            HostCall::AddLabels {
                number: 1,
                labels: vec![ISSUE_LABEL.to_string()],
            },
        ]
    );
    assert_eq!(rendered.title, "Found 1 broken link in 3 scanned files");
}

/// Test closing an issue once every link works again
#[tokio::test]
async fn test_reconcile_withIssueAndNoBrokenLinks_shouldCommentThenClose() {
    let host = MockSourceHost::new().with_issue(BOT, "Found 2 broken links in 3 scanned files", "old body");

    let action = reconcile_issue(&host, &repository(), BOT, &report_with(&[])).await.unwrap();

    assert_eq!(action, IssueAction::Closed(1));
    let calls = host.calls();
    assert_eq!(
        calls[0],
        HostCall::CreateComment {
            number: 1,
            body: CLOSE_COMMENT.to_string(),
        }
    );
    assert!(matches!(&calls[1], HostCall::UpdateIssue { number: 1, update } if update.state == Some(IssueState::Closed)));
    assert_eq!(host.issues()[0].state, IssueState::Closed);
}

/// Test leaving a matching issue untouched
#[tokio::test]
async fn test_reconcile_withMatchingIssue_shouldNotTouchIt() {
    let report = report_with(&["https://gone.example/"]);
    let rendered = render_issue(&report);
    let host = MockSourceHost::new().with_issue(BOT, &rendered.title, &rendered.body);

    let action = reconcile_issue(&host, &repository(), BOT, &report).await.unwrap();

    assert_eq!(action, IssueAction::UpToDate(1));
    assert!(host.calls().is_empty());
}

/// Test rewriting an outdated issue and explaining why
#[tokio::test]
async fn test_reconcile_withOutdatedIssue_shouldUpdateThenComment() {
    let host = MockSourceHost::new().with_issue(BOT, "Found 1 broken link in 3 scanned files", "stale body");
    let report = report_with(&["https://gone.example/", "https://missing.example/"]);

    let action = reconcile_issue(&host, &repository(), BOT, &report).await.unwrap();

    assert_eq!(action, IssueAction::Updated(1));
    let rendered = render_issue(&report);
    let calls = host.calls();
    assert!(matches!(&calls[0], HostCall::UpdateIssue { number: 1, update }
        if update.title.as_deref() == Some(rendered.title.as_str()) && update.state.is_none()));
    assert_eq!(
        calls[1],
        HostCall::CreateComment {
            number: 1,
            body: UPDATE_COMMENT.to_string(),
        }
    );
    assert_eq!(host.issues()[0].title, "Found 2 broken links in 3 scanned files");
}

/// Test that issues filed by other users are ignored
#[tokio::test]
async fn test_reconcile_withIssueFromAnotherUser_shouldCreateNewIssue() {
    let host = MockSourceHost::new().with_issue("someone-else", "Found 1 broken link in 9 scanned files", "");

    let action = reconcile_issue(&host, &repository(), BOT, &report_with(&["https://gone.example/"]))
        .await
        .unwrap();

    assert_eq!(action, IssueAction::Created(2));
}
