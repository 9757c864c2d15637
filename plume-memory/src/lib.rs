//! In-memory backend adapter for Plume.
//!
//! Stores flat documents in a `DashMap` per collection. Useful as the
//! reference [`Backend`] implementation and as a test double for code
//! written against the repository contract. Honors the `ttl` type-level
//! hint (seconds): expired records are lazily evicted on access.

use dashmap::DashMap;
use plume_core::{FieldMappingTable, FlatMap};
use plume_data::{Backend, DataError, UpsertItem, UpsertOutcome};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredRecord {
    fields: FlatMap,
    inserted: Instant,
}

/// A thread-safe in-memory [`Backend`].
///
/// # Example
///
/// ```ignore
/// let repo = BackendRepository::<User, _>::new(MemoryBackend::new())?;
/// ```
#[derive(Default)]
pub struct MemoryBackend {
    collections: DashMap<String, DashMap<String, StoredRecord>>,
    ttls: DashMap<String, Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_expired(&self, collection: &str, record: &StoredRecord) -> bool {
        self.ttls
            .get(collection)
            .map(|ttl| record.inserted.elapsed() >= *ttl)
            .unwrap_or(false)
    }

    /// Remove expired records from a collection.
    fn evict_expired(&self, collection: &str) {
        if let Some(records) = self.collections.get(collection) {
            let ttl = match self.ttls.get(collection) {
                Some(ttl) => *ttl,
                None => return,
            };
            let before = records.len();
            records.retain(|_, record| record.inserted.elapsed() < ttl);
            let evicted = before - records.len();
            if evicted > 0 {
                tracing::debug!(collection, evicted, "evicted expired records");
            }
        }
    }
}

impl Backend for MemoryBackend {
    fn read_one(
        &self,
        collection: &str,
        _id_key: &str,
        id: &str,
    ) -> Result<Option<FlatMap>, DataError> {
        let Some(records) = self.collections.get(collection) else {
            return Ok(None);
        };
        if let Some(record) = records.get(id) {
            if self.is_expired(collection, &record) {
                // Expired — drop the read guard before removing
                drop(record);
                records.remove(id);
                tracing::debug!(collection, id, "evicted expired record");
                return Ok(None);
            }
            return Ok(Some(record.fields.clone()));
        }
        Ok(None)
    }

    fn read_all(&self, collection: &str) -> Result<Vec<FlatMap>, DataError> {
        self.evict_expired(collection);
        let Some(records) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(records
            .iter()
            .map(|record| record.fields.clone())
            .collect())
    }

    fn upsert_batch(
        &self,
        collection: &str,
        batch: Vec<UpsertItem>,
    ) -> Result<Vec<UpsertOutcome>, DataError> {
        let records = self
            .collections
            .entry(collection.to_string())
            .or_default();
        let mut outcomes = Vec::with_capacity(batch.len());
        for item in batch {
            outcomes.push(UpsertOutcome::applied(item.id.clone()));
            records.insert(
                item.id,
                StoredRecord {
                    fields: item.fields,
                    inserted: Instant::now(),
                },
            );
        }
        Ok(outcomes)
    }

    fn delete_one(&self, collection: &str, _id_key: &str, id: &str) -> Result<(), DataError> {
        if let Some(records) = self.collections.get(collection) {
            records.remove(id);
        }
        Ok(())
    }

    fn count(&self, collection: &str) -> Result<u64, DataError> {
        self.evict_expired(collection);
        Ok(self
            .collections
            .get(collection)
            .map(|records| records.len() as u64)
            .unwrap_or(0))
    }

    fn prepare(&self, collection: &str, table: &FieldMappingTable) -> Result<(), DataError> {
        if let Some(hint) = table.hint("ttl") {
            let seconds: u64 = hint
                .value
                .unwrap_or_default()
                .parse()
                .map_err(|_| {
                    DataError::Other(format!(
                        "invalid ttl hint on `{}`: expected seconds",
                        table.entity()
                    ))
                })?;
            if seconds > 0 {
                tracing::debug!(collection, seconds, "applying ttl from entity hint");
                self.ttls
                    .insert(collection.to_string(), Duration::from_secs(seconds));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_core::Value;

    fn item(id: &str, body: &str) -> UpsertItem {
        let mut fields = FlatMap::new();
        fields.insert("_id", Value::Str(id.to_string()));
        fields.insert("body", Value::Str(body.to_string()));
        UpsertItem {
            id_key: "_id".into(),
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn test_upsert_replaces_by_identity() {
        let backend = MemoryBackend::new();
        backend
            .upsert_batch("things", vec![item("a", "one")])
            .unwrap();
        backend
            .upsert_batch("things", vec![item("a", "two")])
            .unwrap();
        assert_eq!(backend.count("things").unwrap(), 1);
        let stored = backend.read_one("things", "_id", "a").unwrap().unwrap();
        assert_eq!(stored.get("body"), Some(&Value::Str("two".into())));
    }

    #[test]
    fn test_missing_collection_reads_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.read_one("nope", "_id", "a").unwrap().is_none());
        assert!(backend.read_all("nope").unwrap().is_empty());
        assert_eq!(backend.count("nope").unwrap(), 0);
        backend.delete_one("nope", "_id", "a").unwrap();
    }
}
