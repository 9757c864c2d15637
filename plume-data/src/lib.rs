//! Data access layer for Plume.
//!
//! Exposes the backend-polymorphic [`Repository`] contract over the mapping
//! engine in `plume-core`: every read funnels a raw backend payload through
//! document reconstruction, every write funnels an entity through forward
//! mapping. Storage engines plug in through the [`Backend`] trait;
//! [`AsyncRepository`] offers an asynchronous façade over the same
//! operations.

pub mod backend;
pub mod error;
pub mod facade;
pub mod repository;

pub use backend::{Backend, UpsertItem, UpsertOutcome};
pub use error::DataError;
pub use facade::AsyncRepository;
pub use repository::{BackendRepository, Repository};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{AsyncRepository, Backend, BackendRepository, DataError, Repository};
}
