//! In-memory storage adapter.
//!
//! The committed graph sits behind an async read-write lock. Views take the
//! read side and borrow the committed graph directly. A unit of work takes the
//! write side and copies the graph the first time it is mutated; commit swaps
//! the copy in. Dropping the unit of work releases the lock and discards the
//! copy, which is how failed workflow operations roll back.

use std::sync::Arc;

use async_trait::async_trait;
use learning::{EntityGraph, GraphView, LearningStore, StoreError, UnitOfWork};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::trace;

/// Exclusive access to the committed graph plus a private copy, made on the
/// first write.
pub(crate) struct WorkingCopy {
    committed: OwnedRwLockWriteGuard<EntityGraph>,
    working: Option<EntityGraph>,
}

impl WorkingCopy {
    pub(crate) async fn acquire(graph: &Arc<RwLock<EntityGraph>>) -> Self {
        let committed = Arc::clone(graph).write_owned().await;
        Self {
            committed,
            working: None,
        }
    }

    pub(crate) fn graph(&self) -> &EntityGraph {
        self.working.as_ref().unwrap_or(&*self.committed)
    }

    pub(crate) fn graph_mut(&mut self) -> &mut EntityGraph {
        let committed: &EntityGraph = &self.committed;
        self.working.get_or_insert_with(|| committed.clone())
    }

    /// Whether anything was written through [`Self::graph_mut`].
    pub(crate) fn is_dirty(&self) -> bool {
        self.working.is_some()
    }

    /// Replaces the committed graph with the working copy, if one was made.
    pub(crate) fn publish(self) {
        let Self {
            mut committed,
            working,
        } = self;
        if let Some(working) = working {
            *committed = working;
        }
    }
}

/// Read guard over the committed graph.
pub(crate) struct SharedView(OwnedRwLockReadGuard<EntityGraph>);

impl SharedView {
    pub(crate) async fn acquire(graph: &Arc<RwLock<EntityGraph>>) -> Self {
        Self(Arc::clone(graph).read_owned().await)
    }
}

impl GraphView for SharedView {
    fn graph(&self) -> &EntityGraph {
        &self.0
    }
}

/// Volatile store; everything is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    graph: Arc<RwLock<EntityGraph>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the committed graph.
    pub async fn snapshot(&self) -> EntityGraph {
        self.graph.read().await.clone()
    }
}

#[async_trait]
impl LearningStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        trace!("beginning in-memory unit of work");
        Ok(Box::new(MemoryUnitOfWork {
            copy: WorkingCopy::acquire(&self.graph).await,
        }))
    }

    async fn read(&self) -> Result<Box<dyn GraphView>, StoreError> {
        Ok(Box::new(SharedView::acquire(&self.graph).await))
    }
}

struct MemoryUnitOfWork {
    copy: WorkingCopy,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn graph(&self) -> &EntityGraph {
        self.copy.graph()
    }

    fn graph_mut(&mut self) -> &mut EntityGraph {
        self.copy.graph_mut()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.copy.publish();
        trace!("committed in-memory unit of work");
        Ok(())
    }
}
