//! Lectern storage adapters.
//!
//! Implements the [`learning::LearningStore`] port with two backends:
//!
//! - [`MemoryStore`] keeps the committed graph in process memory. Used by
//!   tests and by the CLI when `store.backend = "memory"`.
//! - [`JsonFileStore`] additionally writes a JSON snapshot of the graph on
//!   every commit and reloads it on open.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Locking, snapshot I/O, and serialisation live here.
//! Every integrity rule (unique natural keys, parent existence, course ↔
//! module agreement) is enforced by [`learning::EntityGraph`]; adapters only
//! decide when a unit of work's graph becomes the committed one.

mod json_file;
mod memory;

pub use json_file::{JsonFileStore, SnapshotError};
pub use memory::MemoryStore;
