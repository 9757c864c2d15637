use crate::entity::Entity;
use crate::error::MappingError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};

/// The reserved key used for identity fields that do not declare one.
pub const ID_KEY: &str = "_id";

/// A backend-specific tag attached to an entity type or a field.
///
/// The core records hints and ignores them; adapters read the ones they
/// understand (e.g. `ttl`, `indexed`) through the resolved mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub name: &'static str,
    pub value: Option<&'static str>,
}

impl Hint {
    pub fn flag(name: &'static str) -> Self {
        Self { name, value: None }
    }

    pub fn with_value(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            value: Some(value),
        }
    }
}

/// How a field's runtime value is converted before storage.
///
/// `Native` delegates to the field type's [`ToValue`](crate::value::ToValue)
/// rule (scalars pass through, opaque identity types stringify); `Json`
/// stores the value as a JSON-encoded string payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Native,
    Json,
}

/// Declarative description of one persisted field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The Rust field name, used as the accessor handle.
    pub name: &'static str,
    /// The storage key.
    pub key: &'static str,
    pub coercion: Coercion,
    pub identity: bool,
    pub hints: Vec<Hint>,
}

impl FieldSpec {
    /// A plain mapped field. Pass the field's own name as `key` when no
    /// explicit key is declared.
    pub fn mapped(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            key,
            coercion: Coercion::Native,
            identity: false,
            hints: Vec::new(),
        }
    }

    /// The identity field. `key` defaults to [`ID_KEY`] in the builder
    /// macro/derive when unspecified.
    pub fn identity(name: &'static str, key: &'static str) -> Self {
        Self {
            identity: true,
            ..Self::mapped(name, key)
        }
    }

    /// A field stored as a JSON-encoded string payload.
    pub fn serialized(name: &'static str, key: &'static str) -> Self {
        Self {
            coercion: Coercion::Json,
            ..Self::mapped(name, key)
        }
    }

    pub fn hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }
}

/// Declarative metadata for an entity type, as produced by the derive or by
/// explicit registration.
///
/// # Example
///
/// ```ignore
/// EntityDescriptor::new("User")
///     .collection("users")
///     .field(FieldSpec::identity("id", plume_core::metadata::ID_KEY))
///     .field(FieldSpec::mapped("name", "name"))
/// ```
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    entity: &'static str,
    collection: Option<&'static str>,
    fields: Vec<FieldSpec>,
    raw_views: Vec<&'static str>,
    hints: Vec<Hint>,
}

impl EntityDescriptor {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            collection: None,
            fields: Vec::new(),
            raw_views: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn collection(mut self, name: &'static str) -> Self {
        self.collection = Some(name);
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declare the raw-view target: a non-mapped field that receives the
    /// entity's own flat document via
    /// [`Document::apply_raw_view`](crate::document::Document::apply_raw_view).
    /// Declaring more than one is rejected at validation.
    pub fn raw_view(mut self, name: &'static str) -> Self {
        self.raw_views.push(name);
        self
    }

    pub fn hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }
}

/// A validated, immutable field-mapping table for one entity type.
///
/// Derived once per concrete type and shared behind an `Arc` for the process
/// lifetime (see [`resolve`]).
#[derive(Debug)]
pub struct FieldMappingTable {
    descriptor: EntityDescriptor,
    id_index: usize,
}

impl FieldMappingTable {
    /// Validate a descriptor into a mapping table.
    ///
    /// Fails with [`MappingError::Configuration`] when the descriptor has no
    /// identity field, more than one, duplicate or empty keys, more than one
    /// raw-view target, or a raw-view target that is itself a mapped field.
    pub fn new(descriptor: EntityDescriptor) -> Result<Self, MappingError> {
        let entity = descriptor.entity;
        if descriptor.fields.is_empty() {
            return Err(MappingError::Configuration(format!(
                "`{entity}` declares no mapped fields"
            )));
        }

        let mut id_index = None;
        for (index, spec) in descriptor.fields.iter().enumerate() {
            if spec.name.is_empty() || spec.key.is_empty() {
                return Err(MappingError::Configuration(format!(
                    "`{entity}` declares a field with an empty name or key"
                )));
            }
            if descriptor.fields[..index]
                .iter()
                .any(|other| other.key == spec.key)
            {
                return Err(MappingError::Configuration(format!(
                    "`{entity}` maps key `{}` more than once",
                    spec.key
                )));
            }
            if spec.identity {
                if id_index.is_some() {
                    return Err(MappingError::Configuration(format!(
                        "`{entity}` has more than one identity field"
                    )));
                }
                id_index = Some(index);
            }
        }
        let Some(id_index) = id_index else {
            return Err(MappingError::Configuration(format!(
                "`{entity}` has no identity field"
            )));
        };

        if descriptor.raw_views.len() > 1 {
            return Err(MappingError::Configuration(format!(
                "`{entity}` declares more than one raw-view field"
            )));
        }
        if let Some(raw) = descriptor.raw_views.first() {
            if descriptor.fields.iter().any(|spec| spec.name == *raw) {
                return Err(MappingError::Configuration(format!(
                    "raw-view field `{raw}` of `{entity}` must not be a mapped field"
                )));
            }
        }

        Ok(Self {
            descriptor,
            id_index,
        })
    }

    pub fn entity(&self) -> &'static str {
        self.descriptor.entity
    }

    pub fn collection(&self) -> Option<&'static str> {
        self.descriptor.collection
    }

    /// Mapped fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.descriptor.fields
    }

    pub fn id_field(&self) -> &FieldSpec {
        &self.descriptor.fields[self.id_index]
    }

    pub fn id_key(&self) -> &'static str {
        self.id_field().key
    }

    pub fn raw_view(&self) -> Option<&'static str> {
        self.descriptor.raw_views.first().copied()
    }

    /// Type-level backend hints.
    pub fn hints(&self) -> &[Hint] {
        &self.descriptor.hints
    }

    /// Look up a type-level hint by name.
    pub fn hint(&self, name: &str) -> Option<&Hint> {
        self.descriptor.hints.iter().find(|hint| hint.name == name)
    }
}

static TABLES: OnceLock<DashMap<TypeId, Arc<FieldMappingTable>>> = OnceLock::new();

/// Resolve the field-mapping table for `T`.
///
/// The table is computed on first use and cached for the process lifetime;
/// concurrent first resolutions of the same type publish exactly one table
/// (losing racers adopt the published one). Resolution failures are not
/// cached — they are deterministic and recur on retry.
pub fn resolve<T: Entity>() -> Result<Arc<FieldMappingTable>, MappingError> {
    let tables = TABLES.get_or_init(DashMap::new);
    if let Some(table) = tables.get(&TypeId::of::<T>()) {
        return Ok(Arc::clone(&table));
    }
    tracing::debug!(
        entity = std::any::type_name::<T>(),
        "resolving field-mapping table"
    );
    // Built before taking the shard entry: a descriptor is free to resolve
    // other types, which must not run under our own entry lock.
    let table = Arc::new(FieldMappingTable::new(T::descriptor())?);
    match tables.entry(TypeId::of::<T>()) {
        Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
        Entry::Vacant(entry) => {
            entry.insert(Arc::clone(&table));
            Ok(table)
        }
    }
}

/// Drop the cached table for `T`, forcing recomputation on next resolve.
#[doc(hidden)]
pub fn invalidate<T: Entity>() {
    if let Some(tables) = TABLES.get() {
        tables.remove(&TypeId::of::<T>());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_descriptor() -> EntityDescriptor {
        EntityDescriptor::new("User")
            .collection("users")
            .field(FieldSpec::identity("id", ID_KEY))
            .field(FieldSpec::mapped("name", "name"))
            .field(FieldSpec::serialized("tags", "tags"))
    }

    #[test]
    fn test_valid_descriptor_resolves() {
        let table = FieldMappingTable::new(user_descriptor()).unwrap();
        assert_eq!(table.entity(), "User");
        assert_eq!(table.collection(), Some("users"));
        assert_eq!(table.id_key(), "_id");
        assert_eq!(table.fields().len(), 3);
        assert_eq!(table.fields()[2].coercion, Coercion::Json);
    }

    #[test]
    fn test_zero_identity_fields_is_configuration_error() {
        let descriptor = EntityDescriptor::new("Orphan")
            .field(FieldSpec::mapped("name", "name"));
        let err = FieldMappingTable::new(descriptor).unwrap_err();
        assert!(matches!(err, MappingError::Configuration(_)));
        assert!(err.to_string().contains("no identity field"));
    }

    #[test]
    fn test_two_identity_fields_is_configuration_error() {
        let descriptor = EntityDescriptor::new("TwoHeaded")
            .field(FieldSpec::identity("a", "_id"))
            .field(FieldSpec::identity("b", "b"));
        let err = FieldMappingTable::new(descriptor).unwrap_err();
        assert!(matches!(err, MappingError::Configuration(_)));
        assert!(err.to_string().contains("more than one identity field"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let descriptor = EntityDescriptor::new("Dup")
            .field(FieldSpec::identity("id", "_id"))
            .field(FieldSpec::mapped("a", "same"))
            .field(FieldSpec::mapped("b", "same"));
        let err = FieldMappingTable::new(descriptor).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_two_raw_view_fields_rejected() {
        let descriptor = user_descriptor().raw_view("a").raw_view("b");
        let err = FieldMappingTable::new(descriptor).unwrap_err();
        assert!(matches!(err, MappingError::Configuration(_)));
        assert!(err.to_string().contains("more than one raw-view field"));
    }

    #[test]
    fn test_raw_view_must_not_be_mapped() {
        let descriptor = EntityDescriptor::new("SelfRef")
            .field(FieldSpec::identity("id", "_id"))
            .raw_view("id");
        let err = FieldMappingTable::new(descriptor).unwrap_err();
        assert!(err.to_string().contains("raw-view"));
    }

    #[test]
    fn test_hints_are_recorded_and_ignored() {
        let descriptor = user_descriptor()
            .hint(Hint::with_value("ttl", "300"))
            .hint(Hint::flag("sharded"));
        let table = FieldMappingTable::new(descriptor).unwrap();
        assert_eq!(table.hint("ttl").and_then(|h| h.value), Some("300"));
        assert_eq!(table.hint("sharded").map(|h| h.value), Some(None));
        assert!(table.hint("unknown").is_none());
    }
}
