use async_trait::async_trait;
use log::debug;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::HostError;
use crate::providers::{
    Issue, IssueUpdate, NewPullRequest, PullRequest, RemoteRepository, RepositoryRef, SourceHost,
};

/// Page size used for list requests
const PER_PAGE: &str = "100";

/// GitHub client implementing [`SourceHost`]
#[derive(Clone)]
pub struct GitHub {
    inner: Octocrab,
}

impl fmt::Debug for GitHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHub").finish_non_exhaustive()
    }
}

/// Issue as returned by the issues API, which also lists pull requests
#[derive(Debug, Deserialize)]
struct IssuePayload {
    #[serde(flatten)]
    issue: Issue,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    #[serde(default)]
    title: String,
    head: BranchRef,
    base: BranchRef,
}

impl From<PullPayload> for PullRequest {
    fn from(payload: PullPayload) -> Self {
        Self {
            number: payload.number,
            title: payload.title,
            head: payload.head.name,
            base: payload.base.name,
        }
    }
}

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct Labels<'a> {
    labels: &'a [String],
}

fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(error, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

impl GitHub {
    /// Create a client authenticated with a personal access token
    pub fn new(token: &str) -> Result<Self, HostError> {
        let inner = Octocrab::builder().personal_token(token.to_string()).build()?;
        Ok(Self { inner })
    }

    /// Wrap an existing Octocrab instance
    pub fn from_octocrab(inner: Octocrab) -> Self {
        Self { inner }
    }

    fn repo_route(repo: &RepositoryRef, rest: &str) -> String {
        format!("/repos/{}/{}{}", repo.owner, repo.name, rest)
    }
}

#[async_trait]
impl SourceHost for GitHub {
    async fn list_repositories(&self, owner: &str) -> Result<Vec<RemoteRepository>, HostError> {
        let route = format!("/users/{}/repos", owner);
        let mut repositories = Vec::new();
        let mut page = 1u32;
        loop {
            let page_number = page.to_string();
            let params = [("per_page", PER_PAGE), ("page", page_number.as_str())];
            let batch: Vec<RemoteRepository> = self.inner.get(&route, Some(&params)).await?;
            let done = batch.len() < 100;
            repositories.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        debug!("Found {} repositories for '{}'", repositories.len(), owner);
        Ok(repositories)
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<RemoteRepository, HostError> {
        let route = format!("/repos/{}/{}", owner, name);
        match self.inner.get(&route, None::<&()>).await {
            Ok(repository) => Ok(repository),
            Err(e) if is_not_found(&e) => Err(HostError::RepositoryNotFound(format!("{}/{}", owner, name))),
            Err(e) => Err(HostError::Api(e)),
        }
    }

    async fn get_file_contents(&self, repo: &RepositoryRef, path: &str) -> Result<Option<String>, HostError> {
        let response = self
            .inner
            .repos(&repo.owner, &repo.name)
            .get_content()
            .path(path)
            .send()
            .await;

        let mut contents = match response {
            Ok(contents) => contents,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(HostError::Api(e)),
        };

        // A directory path lists its entries instead of returning a file
        if contents.items.len() != 1 {
            return Ok(None);
        }
        let item = contents.items.remove(0);
        item.decoded_content()
            .map(Some)
            .ok_or_else(|| HostError::Decode(format!("{}:{}", repo.full_name(), path)))
    }

    async fn issues_by_creator(&self, repo: &RepositoryRef, creator: &str) -> Result<Vec<Issue>, HostError> {
        let route = Self::repo_route(repo, "/issues");
        let params = [("creator", creator), ("state", "open"), ("per_page", PER_PAGE)];
        let payload: Vec<IssuePayload> = self.inner.get(&route, Some(&params)).await?;
        Ok(payload
            .into_iter()
            .filter(|p| p.pull_request.is_none())
            .map(|p| p.issue)
            .collect())
    }

    async fn create_issue(&self, repo: &RepositoryRef, title: &str, body: &str) -> Result<Issue, HostError> {
        let route = Self::repo_route(repo, "/issues");
        let issue: Issue = self.inner.post(&route, Some(&NewIssue { title, body })).await?;
        Ok(issue)
    }

    async fn update_issue(&self, repo: &RepositoryRef, number: u64, update: &IssueUpdate) -> Result<(), HostError> {
        let route = Self::repo_route(repo, &format!("/issues/{}", number));
        let _: serde_json::Value = self.inner.patch(&route, Some(update)).await?;
        Ok(())
    }

    async fn create_comment(&self, repo: &RepositoryRef, number: u64, body: &str) -> Result<(), HostError> {
        let route = Self::repo_route(repo, &format!("/issues/{}/comments", number));
        let _: serde_json::Value = self.inner.post(&route, Some(&NewComment { body })).await?;
        Ok(())
    }

    async fn add_labels(&self, repo: &RepositoryRef, number: u64, labels: &[String]) -> Result<(), HostError> {
        let route = Self::repo_route(repo, &format!("/issues/{}/labels", number));
        let _: serde_json::Value = self.inner.post(&route, Some(&Labels { labels })).await?;
        Ok(())
    }

    async fn pulls_by_head(&self, repo: &RepositoryRef, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError> {
        let route = Self::repo_route(repo, "/pulls");
        let qualified_head = format!("{}:{}", repo.owner, head);
        let params = [("state", "open"), ("head", qualified_head.as_str()), ("base", base)];
        let pulls: Vec<PullPayload> = self.inner.get(&route, Some(&params)).await?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn create_pull(&self, repo: &RepositoryRef, pull: &NewPullRequest) -> Result<PullRequest, HostError> {
        let route = Self::repo_route(repo, "/pulls");
        let created: PullPayload = self.inner.post(&route, Some(pull)).await?;
        Ok(created.into())
    }
}
