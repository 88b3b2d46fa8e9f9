use chrono::TimeDelta;
use tracing::{debug, info, instrument};

use crate::config::FilterConfig;
use crate::dataset::{PullRequestRecord, Repository};

/// Thresholds applied to the collected dataset.
#[derive(Debug, Clone, Copy)]
pub struct FilterRules {
    /// A repository needs at least this many surviving pull requests.
    pub min_prs_per_repo: usize,
    /// A pull request must stay open at least this long.
    pub min_resolution_time: TimeDelta,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            min_prs_per_repo: 20,
            min_resolution_time: TimeDelta::minutes(10),
        }
    }
}

impl From<&FilterConfig> for FilterRules {
    fn from(config: &FilterConfig) -> Self {
        Self {
            min_prs_per_repo: config.min_prs_per_repo,
            min_resolution_time: TimeDelta::minutes(config.min_resolution_minutes),
        }
    }
}

/// Repositories that passed, plus their names in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub repositories: Vec<Repository>,
    pub names: Vec<String>,
}

impl FilterRules {
    /// A PR survives when it saw a review or a comment and was resolved
    /// (merged, else closed) no sooner than `min_resolution_time` after
    /// creation. Unresolved PRs never survive.
    pub fn keeps(&self, pr: &PullRequestRecord) -> bool {
        let engaged = pr.review_count > 0 || pr.comments_count > 0;
        let long_enough = pr
            .resolution_time()
            .is_some_and(|elapsed| elapsed >= self.min_resolution_time);
        engaged && long_enough
    }

    /// Prune every repository's pull requests and drop repositories left
    /// with fewer than `min_prs_per_repo`.
    #[instrument(skip(self, repositories), fields(repositories = repositories.len()))]
    pub fn apply(&self, repositories: &[Repository]) -> FilterOutcome {
        let mut kept = Vec::new();
        let mut names = Vec::new();

        for repo in repositories {
            let surviving: Vec<PullRequestRecord> = repo
                .pull_requests
                .iter()
                .filter(|pr| self.keeps(pr))
                .cloned()
                .collect();
            debug!(
                repository = %repo.name_with_owner,
                total = repo.pull_requests.len(),
                surviving = surviving.len(),
                "filtered pull requests"
            );

            if surviving.len() >= self.min_prs_per_repo {
                names.push(repo.name_with_owner.clone());
                kept.push(Repository {
                    pull_requests: surviving,
                    ..repo.clone()
                });
            }
        }

        info!(kept = kept.len(), "repositories passed the filter");
        FilterOutcome {
            repositories: kept,
            names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{sample_record, sample_repository};

    /// `good` surviving PRs followed by `bad` ones without any engagement.
    fn repo_with(name: &str, good: usize, bad: usize) -> Repository {
        let mut records: Vec<_> = (0..good).map(|_| sample_record(60, 1, 0)).collect();
        records.extend((0..bad).map(|_| sample_record(60, 0, 0)));
        sample_repository(name, records)
    }

    #[test]
    fn test_survival_requires_engagement() {
        let rules = FilterRules::default();
        assert!(rules.keeps(&sample_record(60, 1, 0)));
        assert!(rules.keeps(&sample_record(60, 0, 1)));
        assert!(!rules.keeps(&sample_record(60, 0, 0)));
    }

    #[test]
    fn test_survival_requires_ten_minutes() {
        let rules = FilterRules::default();
        assert!(rules.keeps(&sample_record(10, 1, 1)));
        assert!(!rules.keeps(&sample_record(9, 1, 1)));
    }

    #[test]
    fn test_merged_at_used_when_closed_at_missing() {
        let mut pr = sample_record(30, 1, 0);
        pr.closed_at = None;
        assert!(FilterRules::default().keeps(&pr));
    }

    #[test]
    fn test_merge_time_wins_over_close_time() {
        let mut pr = sample_record(5, 1, 0);
        pr.closed_at = Some(pr.created_at + TimeDelta::hours(3));
        // merged after five minutes: too quick, regardless of close time
        assert!(!FilterRules::default().keeps(&pr));
    }

    #[test]
    fn test_unresolved_excluded() {
        let mut pr = sample_record(600, 5, 5);
        pr.closed_at = None;
        pr.merged_at = None;
        assert!(!FilterRules::default().keeps(&pr));
    }

    #[test]
    fn test_repository_with_22_survivors_kept() {
        let outcome = FilterRules::default().apply(&[repo_with("a/b", 22, 3)]);
        assert_eq!(outcome.repositories.len(), 1);
        assert_eq!(outcome.repositories[0].pull_requests.len(), 22);
        assert_eq!(outcome.names, vec!["a/b".to_string()]);
    }

    #[test]
    fn test_repository_with_15_survivors_dropped() {
        let outcome = FilterRules::default().apply(&[repo_with("a/b", 15, 10), repo_with("c/d", 20, 0)]);
        assert_eq!(outcome.names, vec!["c/d".to_string()]);
        assert!(outcome.repositories.iter().all(|r| r.name_with_owner != "a/b"));
    }

    #[test]
    fn test_every_kept_repository_meets_minimum() {
        let input: Vec<_> = (0..30)
            .map(|i| repo_with(&format!("o/r{i}"), i, 30 - i))
            .collect();
        let outcome = FilterRules::default().apply(&input);
        assert_eq!(outcome.repositories.len(), 10);
        assert!(outcome.repositories.iter().all(|r| r.pull_requests.len() >= 20));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let input = vec![repo_with("a/b", 22, 3), repo_with("c/d", 5, 30), repo_with("e/f", 40, 1)];
        let rules = FilterRules::default();
        let once = rules.apply(&input);
        let twice = rules.apply(&once.repositories);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rules_from_config() {
        let config = FilterConfig {
            min_prs_per_repo: 3,
            min_resolution_minutes: 60,
            ..FilterConfig::default()
        };
        let rules = FilterRules::from(&config);
        assert_eq!(rules.min_prs_per_repo, 3);
        assert!(!rules.keeps(&sample_record(59, 1, 0)));
    }
}
