use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::dataset::PullRequestState;

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    pub search: SearchConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    #[serde(default)]
    pub edges: Vec<SearchEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct SearchEdge {
    pub node: Option<RepositoryNode>,
}

/// A repository as returned by the star-ranked search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name_with_owner: String,
    #[serde(default)]
    pub stargazer_count: u64,
    #[serde(default)]
    pub url: String,
}

impl RepositoryNode {
    /// Split `owner/name`.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        self.name_with_owner
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<RepositoryPullRequests>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPullRequests {
    pub pull_requests: PullRequestConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestConnection {
    #[serde(default)]
    pub edges: Vec<PullRequestEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEdge {
    #[serde(default)]
    pub node: Option<PullRequestNode>,
}

/// `{ totalCount }` connection summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    #[serde(default)]
    pub total_count: u64,
}

/// A pull request exactly as GitHub sends it: any field may be null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PullRequestNode {
    pub title: Option<String>,
    pub url: Option<String>,
    pub state: Option<PullRequestState>,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub reviews: Option<TotalCount>,
    pub files: Option<TotalCount>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub body: Option<String>,
    pub participants: Option<TotalCount>,
    pub comments: Option<TotalCount>,
}

/// One page of the repository search.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub repositories: Vec<RepositoryNode>,
    pub page_info: PageInfo,
}

/// One page of a repository's pull requests.
#[derive(Debug, Clone, Default)]
pub struct PullRequestPage {
    pub pull_requests: Vec<PullRequestNode>,
    pub page_info: PageInfo,
}
