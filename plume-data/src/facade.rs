use crate::error::DataError;
use crate::repository::Repository;
use plume_core::Entity;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Asynchronous façade over a synchronous [`Repository`].
///
/// Each call runs the same synchronous operation on a tokio blocking worker
/// and delivers its result through the returned future. No operation is
/// inherently non-blocking at the core layer; cancellation is best-effort —
/// dropping a future does not interrupt a backend call already in progress.
///
/// # Example
///
/// ```ignore
/// let repo = AsyncRepository::new(BackendRepository::<User, _>::new(backend)?);
/// let user = repo.find(user_id).await?;
/// ```
pub struct AsyncRepository<T, R> {
    inner: Arc<R>,
    handle: Handle,
    _marker: PhantomData<fn() -> T>,
}

impl<T, R> Clone for AsyncRepository<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, R> AsyncRepository<T, R>
where
    T: Entity,
    R: Repository<T> + 'static,
{
    /// Wrap a repository, dispatching onto the current tokio runtime.
    ///
    /// Panics outside a runtime context; use
    /// [`with_handle`](AsyncRepository::with_handle) to inject one
    /// explicitly.
    pub fn new(inner: R) -> Self {
        Self::with_handle(inner, Handle::current())
    }

    /// Wrap a repository, dispatching onto the given runtime handle.
    pub fn with_handle(inner: R, handle: Handle) -> Self {
        Self {
            inner: Arc::new(inner),
            handle,
            _marker: PhantomData,
        }
    }

    /// Get the underlying synchronous repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    async fn run<F, O>(&self, op: F) -> Result<O, DataError>
    where
        F: FnOnce(&R) -> Result<O, DataError> + Send + 'static,
        O: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.handle
            .spawn_blocking(move || op(&inner))
            .await
            .map_err(|err| DataError::Other(format!("worker task failed: {err}")))?
    }

    pub async fn find(&self, id: T::Id) -> Result<Option<T>, DataError> {
        self.run(move |repo| repo.find(&id)).await
    }

    pub async fn find_all(&self) -> Result<Vec<T>, DataError> {
        self.run(|repo| repo.find_all()).await
    }

    pub async fn find_one_where<P>(&self, predicate: P) -> Result<Option<T>, DataError>
    where
        P: Fn(&T) -> bool + Send + 'static,
    {
        self.run(move |repo| repo.find_one_where(&predicate)).await
    }

    pub async fn find_all_where<P>(&self, predicate: P) -> Result<Vec<T>, DataError>
    where
        P: Fn(&T) -> bool + Send + 'static,
    {
        self.run(move |repo| repo.find_all_where(&predicate)).await
    }

    pub async fn save(&self, entity: T) -> Result<(), DataError> {
        self.run(move |repo| repo.save(&entity)).await
    }

    pub async fn save_all(&self, entities: Vec<T>) -> Result<(), DataError> {
        self.run(move |repo| repo.save_all(&entities)).await
    }

    pub async fn count(&self) -> Result<u64, DataError> {
        self.run(|repo| repo.count()).await
    }

    pub async fn delete_by_id(&self, id: T::Id) -> Result<(), DataError> {
        self.run(move |repo| repo.delete_by_id(&id)).await
    }

    pub async fn delete(&self, entity: T) -> Result<(), DataError> {
        self.run(move |repo| repo.delete(&entity)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_core::{CoerceError, EntityDescriptor, FieldSpec, FromValue, ToValue, Value, ID_KEY};
    use std::sync::Mutex;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Item {
        id: u32,
    }

    impl Entity for Item {
        type Id = u32;

        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Item")
                .collection("items")
                .field(FieldSpec::identity("id", ID_KEY))
        }

        fn id(&self) -> &u32 {
            &self.id
        }

        fn read_field(&self, name: &str) -> Result<Value, CoerceError> {
            match name {
                "id" => Ok(self.id.to_value()),
                other => Err(CoerceError::new("known field", other)),
            }
        }

        fn write_field(&mut self, name: &str, value: &Value) -> Result<(), CoerceError> {
            match name {
                "id" => self.id = FromValue::from_value(value)?,
                other => return Err(CoerceError::new("known field", other)),
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct VecRepository {
        items: Mutex<Vec<Item>>,
    }

    impl Repository<Item> for VecRepository {
        fn find(&self, id: &u32) -> Result<Option<Item>, DataError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .find(|item| item.id == *id)
                .cloned())
        }

        fn find_all(&self) -> Result<Vec<Item>, DataError> {
            Ok(self.items.lock().unwrap().clone())
        }

        fn save_all(&self, entities: &[Item]) -> Result<(), DataError> {
            let mut items = self.items.lock().unwrap();
            for entity in entities {
                items.retain(|item| item.id != entity.id);
                items.push(entity.clone());
            }
            Ok(())
        }

        fn count(&self) -> Result<u64, DataError> {
            Ok(self.items.lock().unwrap().len() as u64)
        }

        fn delete_by_id(&self, id: &u32) -> Result<(), DataError> {
            self.items.lock().unwrap().retain(|item| item.id != *id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_operations_run_on_blocking_workers_and_return() {
        let repo = AsyncRepository::new(VecRepository::default());
        repo.save(Item { id: 1 }).await.unwrap();
        repo.save_all(vec![Item { id: 2 }, Item { id: 3 }])
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.find(2).await.unwrap(), Some(Item { id: 2 }));
        let found = repo.find_one_where(|item: &Item| item.id > 2).await.unwrap();
        assert_eq!(found, Some(Item { id: 3 }));

        repo.delete_by_id(1).await.unwrap();
        repo.delete(Item { id: 2 }).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap(), vec![Item { id: 3 }]);
    }

    #[tokio::test]
    async fn test_clones_share_the_inner_repository() {
        let repo = AsyncRepository::new(VecRepository::default());
        let clone = repo.clone();
        repo.save(Item { id: 9 }).await.unwrap();
        assert_eq!(clone.find(9).await.unwrap(), Some(Item { id: 9 }));
        assert_eq!(clone.inner().count().unwrap(), 1);
    }
}
