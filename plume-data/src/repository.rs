use crate::backend::{Backend, UpsertItem};
use crate::error::DataError;
use plume_core::{metadata, Document, Entity, FieldMappingTable, ToValue};
use std::marker::PhantomData;
use std::sync::Arc;

/// Generic synchronous repository contract over one entity type.
///
/// Backends are selected by the implementing type; callers hold a value of
/// this trait and never name a concrete storage engine. The asynchronous
/// façade over the same operations lives in
/// [`AsyncRepository`](crate::facade::AsyncRepository).
pub trait Repository<T: Entity>: Send + Sync {
    /// Get the entity with the given id, or `None`.
    fn find(&self, id: &T::Id) -> Result<Option<T>, DataError>;

    /// Get all stored entities. Order is backend-defined and not guaranteed
    /// stable across calls.
    fn find_all(&self) -> Result<Vec<T>, DataError>;

    /// First entity matching the predicate, or `None`.
    ///
    /// The default evaluates client-side over a full scan; adapters with
    /// server-side filtering override it. Lacking push-down is a
    /// capability, not an error.
    fn find_one_where(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Option<T>, DataError> {
        Ok(self.find_all()?.into_iter().find(|entity| predicate(entity)))
    }

    /// All entities matching the predicate. Same capability note as
    /// [`find_one_where`](Repository::find_one_where).
    fn find_all_where(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>, DataError> {
        let mut entities = self.find_all()?;
        entities.retain(|entity| predicate(entity));
        Ok(entities)
    }

    /// Save one entity. Sugar for [`save_all`](Repository::save_all).
    fn save(&self, entity: &T) -> Result<(), DataError> {
        self.save_all(std::slice::from_ref(entity))
    }

    /// Upsert the given entities, matched by identity value, as one batched
    /// backend operation where supported. Saving zero entities performs
    /// zero backend calls. Item-level failures surface as
    /// [`DataError::PartialFailure`].
    fn save_all(&self, entities: &[T]) -> Result<(), DataError>;

    /// Number of stored entities.
    fn count(&self) -> Result<u64, DataError>;

    /// Delete the entity with the given id. Deleting a nonexistent id is
    /// not an error.
    fn delete_by_id(&self, id: &T::Id) -> Result<(), DataError>;

    /// Delete the given entity, addressed by its identity value.
    fn delete(&self, entity: &T) -> Result<(), DataError> {
        self.delete_by_id(entity.id())
    }
}

/// The generic [`Repository`] implementation over any [`Backend`].
///
/// Every read funnels the raw backend payload through
/// [`Document::reconstruct`]; every write funnels the entity through
/// [`Document::build`] before the backend sees it.
///
/// # Example
///
/// ```ignore
/// let repo = BackendRepository::<User, _>::new(MemoryBackend::new())?;
/// repo.save(&user)?;
/// let found = repo.find(&user_id)?;
/// ```
pub struct BackendRepository<T: Entity, B: Backend> {
    backend: B,
    collection: String,
    table: Arc<FieldMappingTable>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity, B: Backend> BackendRepository<T, B> {
    /// Build a repository using the collection name from the entity's
    /// metadata. Fails when the type declares none.
    pub fn new(backend: B) -> Result<Self, DataError> {
        let table = metadata::resolve::<T>()?;
        let Some(collection) = table.collection() else {
            return Err(DataError::Mapping(plume_core::MappingError::Configuration(
                format!(
                    "`{}` declares no collection name; use `with_collection`",
                    table.entity()
                ),
            )));
        };
        Self::with_collection(backend, collection)
    }

    /// Build a repository over an explicitly named collection, overriding
    /// (or supplying) the metadata name.
    pub fn with_collection(backend: B, collection: impl Into<String>) -> Result<Self, DataError> {
        let table = metadata::resolve::<T>()?;
        let collection = collection.into();
        backend.prepare(&collection, &table)?;
        Ok(Self {
            backend,
            collection,
            table,
            _marker: PhantomData,
        })
    }

    /// Get the underlying backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn id_string(id: &T::Id) -> String {
        id.to_value().canonical_string()
    }
}

impl<T: Entity, B: Backend> Repository<T> for BackendRepository<T, B> {
    fn find(&self, id: &T::Id) -> Result<Option<T>, DataError> {
        let flat = self
            .backend
            .read_one(&self.collection, self.table.id_key(), &Self::id_string(id))?;
        Ok(Document::reconstruct(flat.as_ref())?)
    }

    fn find_all(&self) -> Result<Vec<T>, DataError> {
        let payloads = self.backend.read_all(&self.collection)?;
        let mut entities = Vec::with_capacity(payloads.len());
        for flat in &payloads {
            match Document::reconstruct::<T>(Some(flat)) {
                Ok(Some(entity)) => entities.push(entity),
                Ok(None) => {}
                // A malformed record is fatal for itself only; it must not
                // abort the batch read of the remaining records.
                Err(err) => tracing::warn!(
                    collection = %self.collection,
                    id = flat
                        .get(self.table.id_key())
                        .map(|v| v.canonical_string())
                        .unwrap_or_default(),
                    %err,
                    "skipping undecodable record"
                ),
            }
        }
        Ok(entities)
    }

    fn save_all(&self, entities: &[T]) -> Result<(), DataError> {
        if entities.is_empty() {
            return Ok(());
        }
        // Map everything up front: construction either fully succeeds or
        // fails before the backend sees any document.
        let mut batch = Vec::with_capacity(entities.len());
        for entity in entities {
            let document = Document::build(entity)?;
            batch.push(UpsertItem {
                id_key: document.id_key().to_string(),
                id: document.id_string(),
                fields: document.into_fields(),
            });
        }
        tracing::trace!(
            collection = %self.collection,
            items = batch.len(),
            "upserting batch"
        );
        let outcomes = self.backend.upsert_batch(&self.collection, batch)?;
        let failures: Vec<(String, String)> = outcomes
            .into_iter()
            .filter_map(|outcome| outcome.error.map(|detail| (outcome.id, detail)))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DataError::PartialFailure { failures })
        }
    }

    fn count(&self) -> Result<u64, DataError> {
        self.backend.count(&self.collection)
    }

    fn delete_by_id(&self, id: &T::Id) -> Result<(), DataError> {
        self.backend
            .delete_one(&self.collection, self.table.id_key(), &Self::id_string(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UpsertOutcome;
    use plume_core::{
        CoerceError, EntityDescriptor, FieldSpec, FlatMap, FromValue, Value, ID_KEY,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Note {
        id: i64,
        body: String,
    }

    impl Entity for Note {
        type Id = i64;

        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Note")
                .collection("notes")
                .field(FieldSpec::identity("id", ID_KEY))
                .field(FieldSpec::mapped("body", "body"))
        }

        fn id(&self) -> &i64 {
            &self.id
        }

        fn read_field(&self, name: &str) -> Result<Value, CoerceError> {
            match name {
                "id" => Ok(self.id.to_value()),
                "body" => Ok(self.body.to_value()),
                other => Err(CoerceError::new("known field", other)),
            }
        }

        fn write_field(&mut self, name: &str, value: &Value) -> Result<(), CoerceError> {
            match name {
                "id" => self.id = FromValue::from_value(value)?,
                "body" => self.body = FromValue::from_value(value)?,
                other => return Err(CoerceError::new("known field", other)),
            }
            Ok(())
        }
    }

    /// Counts backend calls and can fail chosen upsert items.
    #[derive(Default)]
    struct StubBackend {
        upsert_calls: AtomicUsize,
        fail_ids: Vec<String>,
        stored: Mutex<Vec<UpsertItem>>,
    }

    impl Backend for StubBackend {
        fn read_one(
            &self,
            _collection: &str,
            _id_key: &str,
            id: &str,
        ) -> Result<Option<FlatMap>, DataError> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.fields.clone()))
        }

        fn read_all(&self, _collection: &str) -> Result<Vec<FlatMap>, DataError> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .map(|item| item.fields.clone())
                .collect())
        }

        fn upsert_batch(
            &self,
            _collection: &str,
            batch: Vec<UpsertItem>,
        ) -> Result<Vec<UpsertOutcome>, DataError> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = Vec::with_capacity(batch.len());
            for item in batch {
                if self.fail_ids.contains(&item.id) {
                    outcomes.push(UpsertOutcome::failed(item.id, "constraint violation"));
                } else {
                    outcomes.push(UpsertOutcome::applied(item.id.clone()));
                    self.stored.lock().unwrap().push(item);
                }
            }
            Ok(outcomes)
        }

        fn delete_one(
            &self,
            _collection: &str,
            _id_key: &str,
            id: &str,
        ) -> Result<(), DataError> {
            self.stored.lock().unwrap().retain(|item| item.id != id);
            Ok(())
        }
    }

    #[test]
    fn test_save_all_with_zero_entities_makes_no_backend_call() {
        let repo = BackendRepository::<Note, _>::new(StubBackend::default()).unwrap();
        repo.save_all(&[]).unwrap();
        assert_eq!(repo.backend().upsert_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_save_all_is_one_batched_call() {
        let repo = BackendRepository::<Note, _>::new(StubBackend::default()).unwrap();
        let notes = vec![
            Note { id: 1, body: "a".into() },
            Note { id: 2, body: "b".into() },
        ];
        repo.save_all(&notes).unwrap();
        assert_eq!(repo.backend().upsert_calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_partial_batch_failure_is_reported() {
        let backend = StubBackend {
            fail_ids: vec!["2".into()],
            ..StubBackend::default()
        };
        let repo = BackendRepository::<Note, _>::new(backend).unwrap();
        let notes = vec![
            Note { id: 1, body: "a".into() },
            Note { id: 2, body: "b".into() },
        ];
        let err = repo.save_all(&notes).unwrap_err();
        match err {
            DataError::PartialFailure { failures } => {
                assert_eq!(failures, vec![("2".into(), "constraint violation".into())]);
            }
            other => panic!("expected partial failure, got {other}"),
        }
        // The non-failing item was still applied.
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_find_missing_is_none() {
        let repo = BackendRepository::<Note, _>::new(StubBackend::default()).unwrap();
        assert_eq!(repo.find(&42).unwrap(), None);
    }

    #[test]
    fn test_find_all_skips_undecodable_records() {
        let repo = BackendRepository::<Note, _>::new(StubBackend::default()).unwrap();
        repo.save(&Note { id: 1, body: "ok".into() }).unwrap();

        // Poison a second record with a body no coercion rule accepts.
        let mut bad = FlatMap::new();
        bad.insert("_id", Value::Int(2));
        bad.insert("body", Value::Bool(true));
        repo.backend().stored.lock().unwrap().push(UpsertItem {
            id_key: "_id".into(),
            id: "2".into(),
            fields: bad,
        });

        let all = repo.find_all().unwrap();
        assert_eq!(all, vec![Note { id: 1, body: "ok".into() }]);
    }

    #[test]
    fn test_predicate_defaults_scan_client_side() {
        let repo = BackendRepository::<Note, _>::new(StubBackend::default()).unwrap();
        repo.save_all(&[
            Note { id: 1, body: "keep".into() },
            Note { id: 2, body: "skip".into() },
            Note { id: 3, body: "keep".into() },
        ])
        .unwrap();

        let kept = repo.find_all_where(&|note: &Note| note.body == "keep").unwrap();
        assert_eq!(kept.len(), 2);
        let one = repo.find_one_where(&|note: &Note| note.id == 2).unwrap();
        assert_eq!(one.map(|n| n.body), Some("skip".into()));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let repo = BackendRepository::<Note, _>::new(StubBackend::default()).unwrap();
        let note = Note { id: 7, body: "x".into() };
        repo.save(&note).unwrap();
        repo.delete(&note).unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        // Deleting again (or any nonexistent id) completes without error.
        repo.delete_by_id(&7).unwrap();
        repo.delete_by_id(&999).unwrap();
    }
}
