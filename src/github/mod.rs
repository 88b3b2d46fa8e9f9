pub mod client;
pub mod types;

pub use client::GraphQlClient;
pub use types::{PullRequestNode, RepositoryNode};

use async_trait::async_trait;
use thiserror::Error;

use types::{PullRequestPage, SearchPage};

/// Repositories requested per search page.
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Pull requests requested per repository page.
pub const PULL_REQUEST_PAGE_SIZE: u32 = 20;

pub const SEARCH_QUERY: &str = r#"
query($cursor: String, $first: Int!) {
  search(query: "stars:>0 sort:stars-desc", type: REPOSITORY, first: $first, after: $cursor) {
    edges {
      node {
        ... on Repository {
          nameWithOwner
          stargazerCount
          url
        }
      }
    }
    pageInfo {
      endCursor
      hasNextPage
    }
  }
}
"#;

pub const PULL_REQUESTS_QUERY: &str = r#"
query($owner: String!, $name: String!, $cursor: String, $first: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequests(states: [MERGED, CLOSED], first: $first, after: $cursor, orderBy: {field: CREATED_AT, direction: DESC}) {
      edges {
        node {
          title
          url
          state
          createdAt
          closedAt
          mergedAt
          reviews { totalCount }
          files { totalCount }
          additions
          deletions
          body
          participants { totalCount }
          comments { totalCount }
        }
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}
"#;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub request timed out: {0}")]
    Timeout(reqwest::Error),

    #[error("GitHub API request failed: {0}")]
    Transport(reqwest::Error),

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GitHub GraphQL errors: {0}")]
    GraphQl(String),

    #[error("GitHub response carried no {0} data")]
    MissingData(&'static str),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err)
        } else {
            ApiError::Transport(err)
        }
    }
}

/// The two fixed queries the collector issues.
///
/// `GraphQlClient` talks to GitHub; tests script pages through their own
/// implementation.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// One page of the most-starred repositories, starting after `cursor`.
    async fn search_repositories(&self, cursor: Option<&str>) -> Result<SearchPage, ApiError>;

    /// One page of merged/closed pull requests for `owner/name`, newest first.
    async fn pull_requests(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
    ) -> Result<PullRequestPage, ApiError>;
}
