use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Terminal state of a pull request as reported by GitHub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullRequestState::Open => write!(f, "OPEN"),
            PullRequestState::Closed => write!(f, "CLOSED"),
            PullRequestState::Merged => write!(f, "MERGED"),
            PullRequestState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A normalized pull request snapshot.
///
/// Field names on the wire follow the collected-dataset format
/// (`reviewCount`, `numberOfFiles`, ...). Every count is present; absent
/// upstream values were already defaulted to zero during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub state: PullRequestState,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_count: u64,
    #[serde(default)]
    pub number_of_files: u64,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub description_size: u64,
    #[serde(default)]
    pub participants_count: u64,
    #[serde(default)]
    pub comments_count: u64,
}

impl PullRequestRecord {
    /// When the PR reached its terminal state: merge time, else close time.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at.or(self.closed_at)
    }

    /// Time from creation to resolution, `None` while unresolved.
    pub fn resolution_time(&self) -> Option<TimeDelta> {
        self.resolved_at().map(|resolved| resolved - self.created_at)
    }
}

/// A repository and the pull requests collected for it, in collection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name_with_owner: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRecord>,
}

/// Datasets written by earlier tooling used `""` for missing timestamps;
/// treat it the same as `null`.
fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}
