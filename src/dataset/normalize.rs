use tracing::warn;

use super::{PullRequestRecord, Repository};
use crate::github::types::TotalCount;
use crate::github::{PullRequestNode, RepositoryNode};

/// Map a raw GraphQL node onto the canonical record.
///
/// Absent `{ totalCount }` objects and counts become zero, an absent body
/// has size zero. A node without `createdAt` cannot be placed in time and
/// yields `None`.
pub fn normalize_pull_request(node: PullRequestNode) -> Option<PullRequestRecord> {
    let Some(created_at) = node.created_at else {
        warn!(url = node.url.as_deref().unwrap_or(""), "dropping pull request without createdAt");
        return None;
    };

    let count = |summary: Option<TotalCount>| {
        summary.unwrap_or_default().total_count
    };

    Some(PullRequestRecord {
        title: node.title.unwrap_or_default(),
        url: node.url.unwrap_or_default(),
        state: node.state.unwrap_or_default(),
        created_at,
        closed_at: node.closed_at,
        merged_at: node.merged_at,
        review_count: count(node.reviews),
        number_of_files: count(node.files),
        additions: node.additions.unwrap_or(0),
        deletions: node.deletions.unwrap_or(0),
        description_size: node.body.as_deref().map_or(0, |body| body.chars().count() as u64),
        participants_count: count(node.participants),
        comments_count: count(node.comments),
    })
}

/// Build the output repository for a discovered node, or `None` if no
/// record survived normalization.
pub fn build_repository(node: &RepositoryNode, records: Vec<PullRequestRecord>) -> Option<Repository> {
    if records.is_empty() {
        return None;
    }
    Some(Repository {
        name_with_owner: node.name_with_owner.clone(),
        stars: node.stargazer_count,
        url: node.url.clone(),
        pull_requests: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PullRequestState;
    use chrono::{TimeZone, Utc};

    fn full_node() -> PullRequestNode {
        PullRequestNode {
            title: Some("Add cache".to_string()),
            url: Some("https://github.com/o/r/pull/3".to_string()),
            state: Some(PullRequestState::Merged),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            closed_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            merged_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            reviews: Some(TotalCount { total_count: 2 }),
            files: Some(TotalCount { total_count: 4 }),
            additions: Some(100),
            deletions: Some(20),
            body: Some("héllo".to_string()),
            participants: Some(TotalCount { total_count: 3 }),
            comments: Some(TotalCount { total_count: 5 }),
        }
    }

    #[test]
    fn test_normalize_full_node() {
        let record = normalize_pull_request(full_node()).unwrap();
        assert_eq!(record.title, "Add cache");
        assert_eq!(record.state, PullRequestState::Merged);
        assert_eq!(record.review_count, 2);
        assert_eq!(record.number_of_files, 4);
        assert_eq!(record.additions, 100);
        assert_eq!(record.deletions, 20);
        assert_eq!(record.participants_count, 3);
        assert_eq!(record.comments_count, 5);
        // counted in characters, not bytes
        assert_eq!(record.description_size, 5);
    }

    #[test]
    fn test_absent_nested_objects_become_zero() {
        let node = PullRequestNode {
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..PullRequestNode::default()
        };
        let record = normalize_pull_request(node).unwrap();
        assert_eq!(record.review_count, 0);
        assert_eq!(record.number_of_files, 0);
        assert_eq!(record.participants_count, 0);
        assert_eq!(record.comments_count, 0);
        assert_eq!(record.additions, 0);
        assert_eq!(record.deletions, 0);
        assert_eq!(record.title, "");
        assert_eq!(record.state, PullRequestState::Unknown);
        assert!(record.closed_at.is_none());
    }

    #[test]
    fn test_null_body_has_zero_size() {
        let node = PullRequestNode {
            body: None,
            ..full_node()
        };
        assert_eq!(normalize_pull_request(node).unwrap().description_size, 0);
    }

    #[test]
    fn test_missing_created_at_is_dropped() {
        let node = PullRequestNode {
            created_at: None,
            ..full_node()
        };
        assert!(normalize_pull_request(node).is_none());
    }

    #[test]
    fn test_repository_without_records_is_omitted() {
        let node = RepositoryNode {
            name_with_owner: "o/r".to_string(),
            stargazer_count: 10,
            url: "https://github.com/o/r".to_string(),
        };
        assert!(build_repository(&node, vec![]).is_none());

        let record = normalize_pull_request(full_node()).unwrap();
        let repo = build_repository(&node, vec![record]).unwrap();
        assert_eq!(repo.stars, 10);
        assert_eq!(repo.pull_requests.len(), 1);
    }
}
