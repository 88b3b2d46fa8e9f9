use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::dataset::{self, DatasetError, Repository};

const PARTIAL_PREFIX: &str = "repos_and_prs_partial_";
const PARTIAL_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to scan checkpoint directory {}: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Partial progress of a collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// 1-based index of the last repository processed.
    pub processed: usize,
    /// Every repository up to `processed` that has at least one record.
    pub repositories: Vec<Repository>,
}

/// Where collection progress is saved and resumed from.
pub trait CheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// The most advanced checkpoint available, if any.
    fn load(&self) -> Result<Option<Checkpoint>, CheckpointError>;
}

/// One `repos_and_prs_partial_{index}.json` file per checkpoint; the index in
/// the file name is the progress marker.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, processed: usize) -> PathBuf {
        self.dir.join(format!("{PARTIAL_PREFIX}{processed}{PARTIAL_SUFFIX}"))
    }

    fn marker_of(path: &Path) -> Option<usize> {
        path.file_name()?
            .to_str()?
            .strip_prefix(PARTIAL_PREFIX)?
            .strip_suffix(PARTIAL_SUFFIX)?
            .parse()
            .ok()
    }
}

impl CheckpointStore for FileCheckpointStore {
    #[instrument(skip(self, checkpoint), fields(processed = checkpoint.processed))]
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let path = self.path_for(checkpoint.processed);
        dataset::save(&path, &checkpoint.repositories)?;
        info!(path = %path.display(), repositories = checkpoint.repositories.len(), "checkpoint saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let scan_err = |source| CheckpointError::Scan {
            dir: self.dir.clone(),
            source,
        };
        let mut latest: Option<(usize, PathBuf)> = None;
        for entry in std::fs::read_dir(&self.dir).map_err(scan_err)? {
            let path = entry.map_err(scan_err)?.path();
            if let Some(marker) = Self::marker_of(&path) {
                if latest.as_ref().map_or(true, |(best, _)| marker > *best) {
                    latest = Some((marker, path));
                }
            }
        }

        let Some((processed, path)) = latest else {
            debug!(dir = %self.dir.display(), "no checkpoint found");
            return Ok(None);
        };
        let repositories = dataset::load(&path)?;
        info!(path = %path.display(), processed, "loaded checkpoint");
        Ok(Some(Checkpoint {
            processed,
            repositories,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{sample_record, sample_repository};

    #[test]
    fn test_empty_directory_has_no_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_returns_saved_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let checkpoint = Checkpoint {
            processed: 10,
            repositories: vec![sample_repository("a/b", vec![sample_record(20, 1, 1)])],
        };
        store.save(&checkpoint).unwrap();
        assert!(dir.path().join("repos_and_prs_partial_10.json").exists());
        assert_eq!(store.load().unwrap(), Some(checkpoint));
    }

    #[test]
    fn test_load_picks_highest_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        for processed in [10, 30, 20] {
            store
                .save(&Checkpoint {
                    processed,
                    repositories: vec![],
                })
                .unwrap();
        }
        std::fs::write(dir.path().join("repos_and_prs_partial_x.json"), "[]").unwrap();
        std::fs::write(dir.path().join("unrelated.json"), "[]").unwrap();

        assert_eq!(store.load().unwrap().unwrap().processed, 30);
    }

    #[test]
    fn test_marker_parsing() {
        assert_eq!(
            FileCheckpointStore::marker_of(Path::new("/tmp/repos_and_prs_partial_120.json")),
            Some(120)
        );
        assert_eq!(FileCheckpointStore::marker_of(Path::new("repos_and_prs.json")), None);
    }
}
