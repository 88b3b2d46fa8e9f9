pub mod normalize;
pub mod types;

pub use types::{PullRequestRecord, PullRequestState, Repository};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk wrapper: every repository is stored as `{"repository": {...}}`.
#[derive(Serialize, Deserialize)]
struct RepositoryEntry {
    repository: Repository,
}

/// Load a collected or filtered dataset.
#[instrument]
pub fn load(path: &Path) -> Result<Vec<Repository>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<RepositoryEntry> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(repositories = entries.len(), "loaded dataset");
    Ok(entries.into_iter().map(|entry| entry.repository).collect())
}

/// Write a dataset in the `[{"repository": {...}}]` layout.
#[instrument(skip(repositories), fields(repositories = repositories.len()))]
pub fn save(path: &Path, repositories: &[Repository]) -> Result<(), DatasetError> {
    let entries: Vec<RepositoryEntry> = repositories
        .iter()
        .cloned()
        .map(|repository| RepositoryEntry { repository })
        .collect();
    write_pretty(path, &entries)
}

/// Write the flat list of repository names that survived filtering.
pub fn save_names(path: &Path, names: &[String]) -> Result<(), DatasetError> {
    write_pretty(path, &names)
}

/// Pretty-print with four-space indentation.
fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
