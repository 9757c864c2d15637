use crate::error::DataError;
use plume_core::{FieldMappingTable, FlatMap};

/// One entry of a batched upsert: the identity key/value and the flat
/// document payload to store under it.
#[derive(Debug, Clone)]
pub struct UpsertItem {
    pub id_key: String,
    pub id: String,
    pub fields: FlatMap,
}

/// Per-item result of a batched upsert.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub id: String,
    pub error: Option<String>,
}

impl UpsertOutcome {
    pub fn applied(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: Some(detail.into()),
        }
    }
}

/// The primitive storage interface every backend adapter implements.
///
/// Adapters translate between the flat key→value payload and their native
/// document/row/hash representation; the core never speaks a backend's wire
/// format directly. Connection lifecycle (connect/close) stays inside the
/// adapter and is not part of this contract.
pub trait Backend: Send + Sync {
    /// Fetch the raw payload stored under the given identity, or `None`.
    fn read_one(
        &self,
        collection: &str,
        id_key: &str,
        id: &str,
    ) -> Result<Option<FlatMap>, DataError>;

    /// Fetch every raw payload in the collection. Order is backend-defined.
    fn read_all(&self, collection: &str) -> Result<Vec<FlatMap>, DataError>;

    /// Upsert a batch in a single backend operation where supported.
    ///
    /// Returns one outcome per item; item-level failures are reported there
    /// rather than failing the whole call.
    fn upsert_batch(
        &self,
        collection: &str,
        batch: Vec<UpsertItem>,
    ) -> Result<Vec<UpsertOutcome>, DataError>;

    /// Delete the payload stored under the given identity. Deleting a
    /// nonexistent identity is not an error.
    fn delete_one(&self, collection: &str, id_key: &str, id: &str) -> Result<(), DataError>;

    /// Number of stored payloads. The default scans `read_all`; adapters
    /// with a native count override it.
    fn count(&self, collection: &str) -> Result<u64, DataError> {
        Ok(self.read_all(collection)?.len() as u64)
    }

    /// Called once when a repository is constructed over this backend, so
    /// the adapter can act on backend-specific hints in the mapping table
    /// (TTLs, index creation, ...). The default ignores all hints.
    fn prepare(&self, collection: &str, table: &FieldMappingTable) -> Result<(), DataError> {
        let _ = (collection, table);
        Ok(())
    }
}
