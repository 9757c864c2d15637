//! Core mapping engine for Plume.
//!
//! Converts typed domain structs into an ordered key→value [`Document`] and
//! back, driven by declarative per-type metadata that is resolved once and
//! cached for the process lifetime. Storage engines are consumed through the
//! repository layer (`plume-data`); this crate performs no I/O.

pub mod document;
pub mod entity;
pub mod error;
pub mod metadata;
pub mod value;

pub use document::{Document, FlatMap};
pub use entity::Entity;
pub use error::{CoerceError, MappingError};
pub use metadata::{
    resolve, Coercion, EntityDescriptor, FieldMappingTable, FieldSpec, Hint, ID_KEY,
};
pub use value::{from_json, to_json, FromValue, ToValue, Value};

pub mod prelude {
    //! Re-exports of the most commonly used mapping types.
    pub use crate::{Document, Entity, EntityDescriptor, FieldSpec, FlatMap, MappingError, Value};
}
