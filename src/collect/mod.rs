pub mod checkpoint;

pub use checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore};

use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::config::CollectConfig;
use crate::dataset::normalize::{build_repository, normalize_pull_request};
use crate::dataset::{PullRequestRecord, Repository};
use crate::github::{ApiError, GitHubApi, PullRequestNode, RepositoryNode};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Repository discovery failed: {0}")]
    Discovery(#[from] ApiError),
}

/// Why a repository's pull-request loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the per-repository record cap.
    CapReached,
    /// Upstream reported no further pages.
    Exhausted,
    /// The wall-clock budget ran out before the next page.
    TimedOut,
    /// A page request failed; records fetched before it are kept.
    Failed,
}

/// Pull requests gathered for one repository.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub nodes: Vec<PullRequestNode>,
    pub stop: StopReason,
}

/// Paginated, time-bounded collector over a `GitHubApi`.
///
/// Requests are issued one at a time. Discovery must fully succeed; pull
/// request collection tolerates failures per repository.
pub struct Collector<A, S> {
    api: A,
    checkpoints: S,
    settings: CollectConfig,
}

impl<A: GitHubApi, S: CheckpointStore> Collector<A, S> {
    pub fn new(api: A, checkpoints: S, settings: CollectConfig) -> Self {
        Self {
            api,
            checkpoints,
            settings,
        }
    }

    /// Page through the star-ranked search until `max_repos` repositories
    /// are known or the search is exhausted. Any page failure is fatal.
    #[instrument(skip(self), fields(cap = self.settings.max_repos))]
    pub async fn discover(&self) -> Result<Vec<RepositoryNode>, CollectError> {
        let cap = self.settings.max_repos;
        let mut repositories = Vec::new();
        let mut cursor: Option<String> = None;
        let mut has_next_page = true;

        while has_next_page && repositories.len() < cap {
            let page = self.api.search_repositories(cursor.as_deref()).await?;
            repositories.extend(page.repositories);
            has_next_page = page.page_info.has_next_page;
            cursor = page.page_info.end_cursor;

            info!(collected = repositories.len(), "repositories discovered");
            self.pause().await;
        }

        repositories.truncate(cap);
        Ok(repositories)
    }

    /// Collect pull requests for a single repository.
    ///
    /// Stops at the record cap, at the last page, when the wall-clock budget
    /// has elapsed (checked before each request), or on the first failed page.
    pub async fn collect_repository(&self, owner: &str, name: &str) -> Harvest {
        let cap = self.settings.max_prs_per_repo;
        let budget = self.settings.repo_timeout();
        let started = Instant::now();
        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;

        let stop = loop {
            if nodes.len() >= cap {
                break StopReason::CapReached;
            }
            if started.elapsed() > budget {
                warn!(budget_secs = budget.as_secs_f64(), "time budget exhausted, keeping partial results");
                break StopReason::TimedOut;
            }

            let page = match self.api.pull_requests(owner, name, cursor.as_deref()).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(error = %err, "page request failed, skipping repository");
                    break StopReason::Failed;
                }
            };

            nodes.extend(page.pull_requests);
            debug!(collected = nodes.len(), "pull requests collected");
            self.pause().await;

            if !page.page_info.has_next_page {
                break StopReason::Exhausted;
            }
            cursor = page.page_info.end_cursor;
        };

        nodes.truncate(cap);
        Harvest { nodes, stop }
    }

    /// Collect pull requests for every repository from the resume point on,
    /// saving a checkpoint every `checkpoint_every` repositories. A checkpoint
    /// that cannot be written is logged and collection continues.
    ///
    /// With a `resume` checkpoint, its repositories are carried over and
    /// collection continues after its marker; otherwise it starts at
    /// `start_index`. Returns the repositories in discovery order, omitting
    /// those without records.
    pub async fn collect(
        &self,
        repositories: &[RepositoryNode],
        resume: Option<Checkpoint>,
    ) -> Result<Vec<Repository>, CollectError> {
        let mut collected: HashMap<String, Vec<PullRequestRecord>> = HashMap::new();
        let start_index = match resume {
            Some(checkpoint) => {
                info!(processed = checkpoint.processed, "resuming from checkpoint");
                for repo in checkpoint.repositories {
                    collected.insert(repo.name_with_owner, repo.pull_requests);
                }
                checkpoint.processed + 1
            }
            None => self.settings.start_index,
        };

        let total = repositories.len().min(self.settings.max_repos);
        for (offset, repo) in repositories
            .iter()
            .take(total)
            .enumerate()
            .skip(start_index.saturating_sub(1))
        {
            let index = offset + 1;
            let span = info_span!("repository", name = %repo.name_with_owner, index, total);

            match repo.owner_and_name() {
                Some((owner, name)) => {
                    let harvest = self.collect_repository(owner, name).instrument(span.clone()).await;
                    let records: Vec<PullRequestRecord> = harvest
                        .nodes
                        .into_iter()
                        .filter_map(normalize_pull_request)
                        .collect();
                    span.in_scope(|| {
                        info!(records = records.len(), stop = ?harvest.stop, "repository done")
                    });
                    collected.insert(repo.name_with_owner.clone(), records);
                }
                None => {
                    span.in_scope(|| warn!("repository name is not owner/name, skipping"));
                }
            }

            if index % self.settings.checkpoint_every == 0 {
                let checkpoint = Checkpoint {
                    processed: index,
                    repositories: assemble(&repositories[..index], &collected),
                };
                if let Err(err) = self.checkpoints.save(&checkpoint) {
                    warn!(error = %err, processed = index, "checkpoint not written, continuing");
                }
            }
        }

        Ok(assemble(&repositories[..total], &collected))
    }

    async fn pause(&self) {
        let pause = self.settings.page_pause();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

/// Pair discovered repositories with their records, in discovery order.
fn assemble(
    repositories: &[RepositoryNode],
    collected: &HashMap<String, Vec<PullRequestRecord>>,
) -> Vec<Repository> {
    repositories
        .iter()
        .filter_map(|node| {
            let records = collected.get(&node.name_with_owner)?.clone();
            build_repository(node, records)
        })
        .collect()
}
