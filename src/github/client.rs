use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

use super::types::{GraphQlResponse, PullRequestPage, RepositoryData, SearchData, SearchPage};
use super::{ApiError, GitHubApi, PULL_REQUESTS_QUERY, PULL_REQUEST_PAGE_SIZE, SEARCH_PAGE_SIZE, SEARCH_QUERY};
use crate::config::{Config, ConfigError};

/// Authenticated client for the GitHub GraphQL endpoint.
pub struct GraphQlClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    /// Applied to pull-request pages only; discovery requests are unbounded.
    request_timeout: Duration,
}

impl GraphQlClient {
    /// Build a client from validated configuration. A missing token is fatal.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let token = config.require_token()?.to_string();
        let client = reqwest::Client::builder()
            .user_agent("pr-insights")
            .build()
            .map_err(|err| ConfigError::Invalid(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            client,
            api_url: config.github.api_url.clone(),
            token,
            request_timeout: Duration::from_secs(config.github.request_timeout_secs),
        })
    }

    /// POST one query and unwrap the GraphQL envelope.
    ///
    /// Anything but HTTP 200 with a non-empty `data` and no `errors` is an error.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
        what: &'static str,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope = response.json::<GraphQlResponse<T>>().await?;
        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(ApiError::GraphQl(messages.join("; ")));
        }
        envelope.data.ok_or(ApiError::MissingData(what))
    }
}

#[async_trait]
impl GitHubApi for GraphQlClient {
    #[instrument(skip(self))]
    async fn search_repositories(&self, cursor: Option<&str>) -> Result<SearchPage, ApiError> {
        let variables = json!({ "cursor": cursor, "first": SEARCH_PAGE_SIZE });
        let data: SearchData = self.execute(SEARCH_QUERY, variables, "search", None).await?;

        let repositories: Vec<_> = data
            .search
            .edges
            .into_iter()
            .filter_map(|edge| edge.node)
            .collect();
        debug!(count = repositories.len(), has_next = data.search.page_info.has_next_page, "received search page");

        Ok(SearchPage {
            repositories,
            page_info: data.search.page_info,
        })
    }

    #[instrument(skip(self))]
    async fn pull_requests(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
    ) -> Result<PullRequestPage, ApiError> {
        let variables = json!({
            "owner": owner,
            "name": name,
            "cursor": cursor,
            "first": PULL_REQUEST_PAGE_SIZE,
        });
        let data: RepositoryData = self
            .execute(PULL_REQUESTS_QUERY, variables, "repository", Some(self.request_timeout))
            .await?;
        let connection = data
            .repository
            .ok_or(ApiError::MissingData("repository"))?
            .pull_requests;

        let pull_requests: Vec<_> = connection
            .edges
            .into_iter()
            .filter_map(|edge| edge.node)
            .collect();
        debug!(count = pull_requests.len(), has_next = connection.page_info.has_next_page, "received pull request page");

        Ok(PullRequestPage {
            pull_requests,
            page_info: connection.page_info,
        })
    }
}
