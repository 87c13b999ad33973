use log::info;

use crate::errors::HostError;
use crate::link_checker::LinkReport;
use crate::providers::{Issue, IssueState, IssueUpdate, RepositoryRef, SourceHost};
use crate::templates::{self, Context, Template};

/// Substring identifying the bot's broken link issue
pub const ISSUE_TITLE_MARKER: &str = "broken link";

/// Label given to new broken link issues
pub const ISSUE_LABEL: &str = "bug";

pub const CLOSE_COMMENT: &str = "Closing existing issue, as link checker now detects no broken links.";
pub const UPDATE_COMMENT: &str = "Updating issue to match latest broken link checker results.";

/// Issue title and body rendered from a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedIssue {
    pub title: String,
    pub body: String,
}

/// What reconciliation did to the issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueAction {
    /// No issue and nothing broken
    Nothing,
    /// A new issue was filed
    Created(u64),
    /// The issue was commented on and closed
    Closed(u64),
    /// The issue already matched the report
    UpToDate(u64),
    /// Title and body were replaced and a comment added
    Updated(u64),
}

/// Render the issue title and body for the broken links of `report`
pub fn render_issue(report: &LinkReport) -> RenderedIssue {
    let broken = report.broken_links();
    let entry = Template::new(Template::BROKEN_LINKS_ENTRY);

    let entries: Vec<String> = broken
        .iter()
        .map(|(url, result)| {
            let mut values = Context::new();
            values.insert("url", url.to_string());
            values.insert(
                "status",
                match result.status {
                    Some(code) if result.message.is_empty() => code.to_string(),
                    Some(code) => format!("{} {}", code, result.message),
                    None => result.message.clone(),
                },
            );
            values.insert(
                "locations",
                result
                    .locations
                    .iter()
                    .map(|path| format!("`{}`", path))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            entry.render(&values).trim_end().to_string()
        })
        .collect();

    let mut values = Context::new();
    values.insert("number_files", report.number_files.to_string());
    values.insert("number_broken", broken.len().to_string());
    values.insert("plural", templates::plural(broken.len()));
    values.insert("broken_links", entries.join("\n"));

    RenderedIssue {
        title: Template::new(Template::BROKEN_LINKS_TITLE).render_line(&values),
        body: Template::new(Template::BROKEN_LINKS_BODY).render(&values),
    }
}

/// The bot's open broken link issue, if any (the last one listed wins)
pub fn find_existing_issue(issues: Vec<Issue>) -> Option<Issue> {
    issues
        .into_iter()
        .filter(|issue| issue.title.contains(ISSUE_TITLE_MARKER))
        .last()
}

/// Bring the bot's broken link issue in line with `report`
///
/// | existing issue | broken links | action                          |
/// |----------------|--------------|---------------------------------|
/// | no             | no           | nothing                         |
/// | no             | yes          | create, label `bug`             |
/// | yes            | no           | comment, close                  |
/// | yes            | yes, same    | nothing                         |
/// | yes            | yes, changed | edit title/body, comment        |
pub async fn reconcile_issue(
    host: &dyn SourceHost,
    repository: &RepositoryRef,
    bot_login: &str,
    report: &LinkReport,
) -> Result<IssueAction, HostError> {
    let rendered = render_issue(report);
    let existing = find_existing_issue(host.issues_by_creator(repository, bot_login).await?);
    let broken = report.has_broken_links();

    match (existing, broken) {
        (None, false) => {
            info!("No broken links found.");
            Ok(IssueAction::Nothing)
        }
        (None, true) => {
            let issue = host.create_issue(repository, &rendered.title, &rendered.body).await?;
            host.add_labels(repository, issue.number, &[ISSUE_LABEL.to_string()]).await?;
            info!("Created issue #{}: {}", issue.number, rendered.title);
            Ok(IssueAction::Created(issue.number))
        }
        (Some(issue), false) => {
            info!("{}", CLOSE_COMMENT);
            host.create_comment(repository, issue.number, CLOSE_COMMENT).await?;
            let update = IssueUpdate {
                state: Some(IssueState::Closed),
                ..Default::default()
            };
            host.update_issue(repository, issue.number, &update).await?;
            Ok(IssueAction::Closed(issue.number))
        }
        (Some(issue), true) => {
            info!("Checking if existing issue matches result.");
            if issue.title == rendered.title && issue.body == rendered.body {
                info!("Existing issue is up to date.");
                return Ok(IssueAction::UpToDate(issue.number));
            }
            info!("{}", UPDATE_COMMENT);
            let update = IssueUpdate {
                title: Some(rendered.title),
                body: Some(rendered.body),
                state: None,
            };
            host.update_issue(repository, issue.number, &update).await?;
            host.create_comment(repository, issue.number, UPDATE_COMMENT).await?;
            Ok(IssueAction::Updated(issue.number))
        }
    }
}
