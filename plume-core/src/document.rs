use crate::entity::Entity;
use crate::error::MappingError;
use crate::metadata;
use crate::value::Value;

/// An ordered string-keyed value map.
///
/// Keys are unique and iteration order is insertion order, which for built
/// documents equals field declaration order. This is the raw payload shape
/// exchanged with backend adapters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMap {
    entries: Vec<(String, Value)>,
}

impl FlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a value, preserving the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut entry.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = FlatMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// The mapped snapshot of one entity instance: its flat field view plus the
/// identity entry pulled out of it.
///
/// Built on demand on the read or write path, immutable once built, and
/// discarded after the adapter consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id_key: String,
    id: Value,
    fields: FlatMap,
}

impl Document {
    /// Forward-map an entity instance into a document.
    ///
    /// Walks the resolved mapping table in declaration order, applying each
    /// field's coercion rule. Construction either fully succeeds or fails
    /// before any adapter sees the document; the identity entry must be
    /// present and non-null.
    pub fn build<T: Entity>(entity: &T) -> Result<Self, MappingError> {
        let table = metadata::resolve::<T>()?;
        let mut fields = FlatMap::with_capacity(table.fields().len());
        for spec in table.fields() {
            let value = entity.read_field(spec.name).map_err(|err| {
                MappingError::Configuration(format!(
                    "cannot map field `{}` of `{}`: {err}",
                    spec.name,
                    table.entity()
                ))
            })?;
            fields.insert(spec.key, value);
        }

        let id = match fields.get(table.id_key()) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                return Err(MappingError::MissingIdentity {
                    entity: table.entity(),
                })
            }
        };
        tracing::trace!(
            entity = table.entity(),
            id = %id.canonical_string(),
            "built document"
        );

        Ok(Self {
            id_key: table.id_key().to_string(),
            id,
            fields,
        })
    }

    /// Reverse-map a raw payload into an entity instance.
    ///
    /// `None` is the not-found sentinel and yields `Ok(None)`. Keys present
    /// in the payload but absent from the mapping table are ignored; mapped
    /// keys absent from the payload keep the field's default value. A value
    /// that fails its reverse coercion is a per-record
    /// [`MappingError::Reconstruction`].
    pub fn reconstruct<T: Entity>(flat: Option<&FlatMap>) -> Result<Option<T>, MappingError> {
        let Some(flat) = flat else {
            return Ok(None);
        };
        let table = metadata::resolve::<T>()?;
        let mut entity = T::default();
        for spec in table.fields() {
            if let Some(value) = flat.get(spec.key) {
                entity.write_field(spec.name, value).map_err(|err| {
                    MappingError::Reconstruction {
                        key: spec.key.to_string(),
                        detail: err.to_string(),
                    }
                })?;
            }
        }
        Ok(Some(entity))
    }

    /// Hand the built flat view back to an entity declaring a raw-view
    /// field. No-op for types without one.
    pub fn apply_raw_view<T: Entity>(&self, entity: &mut T) -> Result<(), MappingError> {
        let table = metadata::resolve::<T>()?;
        if table.raw_view().is_some() {
            entity.set_raw_view(self.fields.clone());
        }
        Ok(())
    }

    /// The storage key of the identity entry.
    pub fn id_key(&self) -> &str {
        &self.id_key
    }

    /// The identity value. Always non-null.
    pub fn id(&self) -> &Value {
        &self.id
    }

    /// The identity value in canonical text form, as used for addressing.
    pub fn id_string(&self) -> String {
        self.id.canonical_string()
    }

    /// The plain key→value view, in field declaration order.
    pub fn fields(&self) -> &FlatMap {
        &self.fields
    }

    pub fn into_fields(self) -> FlatMap {
        self.fields
    }
}
