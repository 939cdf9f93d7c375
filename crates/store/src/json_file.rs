//! JSON snapshot file adapter.
//!
//! Keeps the committed graph in memory like [`crate::MemoryStore`] and, on
//! every commit that changed something, writes the whole graph to disk before
//! publishing it. The
//! write goes to a sibling temporary file that is then renamed over the
//! snapshot, so a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use learning::{EntityGraph, GraphView, LearningStore, StoreError, UnitOfWork};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::memory::{SharedView, WorkingCopy};

/// Failures reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot {path} is not a valid graph: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<SnapshotError> for StoreError {
    fn from(e: SnapshotError) -> Self {
        StoreError::backend(e.to_string())
    }
}

/// Durable store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    graph: Arc<RwLock<EntityGraph>>,
}

impl JsonFileStore {
    /// Opens the snapshot at `path`, starting empty when the file does not
    /// exist yet. The file is created on the first commit.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let graph = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<EntityGraph>(&bytes).map_err(|source| {
                SnapshotError::Format {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "snapshot not found; starting with an empty graph");
                EntityGraph::new()
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.clone(),
                    source,
                }
                .into())
            }
        };
        debug!(path = %path.display(), users = graph.users().count(), courses = graph.courses().count(), "snapshot loaded");
        Ok(Self {
            path,
            graph: Arc::new(RwLock::new(graph)),
        })
    }
}

async fn write_snapshot(path: &Path, graph: &EntityGraph) -> Result<(), SnapshotError> {
    let bytes = serde_json::to_vec_pretty(graph).map_err(|source| SnapshotError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
    }
    tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

#[async_trait]
impl LearningStore for JsonFileStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(FileUnitOfWork {
            path: self.path.clone(),
            copy: WorkingCopy::acquire(&self.graph).await,
        }))
    }

    async fn read(&self) -> Result<Box<dyn GraphView>, StoreError> {
        Ok(Box::new(SharedView::acquire(&self.graph).await))
    }
}

struct FileUnitOfWork {
    path: PathBuf,
    copy: WorkingCopy,
}

#[async_trait]
impl UnitOfWork for FileUnitOfWork {
    fn graph(&self) -> &EntityGraph {
        self.copy.graph()
    }

    fn graph_mut(&mut self) -> &mut EntityGraph {
        self.copy.graph_mut()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { path, copy } = *self;
        if !copy.is_dirty() {
            return Ok(());
        }
        write_snapshot(&path, copy.graph()).await?;
        copy.publish();
        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }
}
