//! Storage port: the traits infrastructure crates implement to persist the
//! [`EntityGraph`].
//!
//! A mutating workflow operation opens one [`UnitOfWork`], reads and mutates
//! the graph through it, and calls [`UnitOfWork::commit`]. Pure lookups open a
//! [`GraphView`] instead, which borrows the committed graph without copying it.
//! Nothing a unit of work does becomes visible to other units of work before
//! commit; dropping it without committing discards every change. Adapters
//! serialize units of work, so the uniqueness indexes inside the graph see
//! every committed row.

use async_trait::async_trait;
use thiserror::Error;

use crate::EntityGraph;

/// Failure raised by the entity graph's constraints or by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Lookup by identifier found no row.
    #[error("{entity} not found: {id}")]
    RowNotFound {
        /// Entity set name (e.g. `"assignment"`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// An insert would create a second row for a natural key.
    #[error("Unique constraint '{constraint}' violated for {key}")]
    UniqueViolation {
        /// Name of the violated constraint (e.g. `"enrollment"`).
        constraint: &'static str,
        /// Rendered natural key.
        key: String,
    },

    /// A mutation would leave the two sides of a relationship disagreeing, or
    /// would reference a row that does not exist.
    #[error("Integrity violation: {message}")]
    Integrity { message: String },

    /// The backend failed to load or persist data.
    #[error("Storage backend failure: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn row_not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::RowNotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// A storage transaction over the entity graph.
///
/// Implementations hand out a private working copy of the graph; `commit`
/// publishes it atomically.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Read access to the working copy.
    fn graph(&self) -> &EntityGraph;

    /// Write access to the working copy.
    fn graph_mut(&mut self) -> &mut EntityGraph;

    /// Publishes every change made through this unit of work.
    ///
    /// On error nothing is published.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Shared, read-only access to the committed graph.
///
/// Views may coexist with each other. A unit of work waits until every open
/// view is dropped.
pub trait GraphView: Send + Sync {
    fn graph(&self) -> &EntityGraph;
}

/// Entry point of a storage adapter.
#[async_trait]
pub trait LearningStore: Send + Sync {
    /// Opens a unit of work. Waits while another unit of work or any view is
    /// open.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Opens a read-only view of the committed graph. Waits while a unit of
    /// work is open.
    async fn read(&self) -> Result<Box<dyn GraphView>, StoreError>;
}
