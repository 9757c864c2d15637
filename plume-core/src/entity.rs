use crate::document::FlatMap;
use crate::error::CoerceError;
use crate::metadata::EntityDescriptor;
use crate::value::{FromValue, ToValue, Value};

/// A domain type whose instances can be mapped to documents and back.
///
/// Intended to be implemented via `#[derive(Entity)]`, which generates the
/// descriptor and the field accessors from declarative attributes. Types can
/// also implement it by hand to register a mapping explicitly:
///
/// # Example
///
/// ```ignore
/// impl Entity for User {
///     type Id = Uuid;
///
///     fn descriptor() -> EntityDescriptor {
///         EntityDescriptor::new("User")
///             .collection("users")
///             .field(FieldSpec::identity("id", ID_KEY))
///             .field(FieldSpec::mapped("name", "name"))
///     }
///
///     fn id(&self) -> &Uuid { &self.id }
///
///     fn read_field(&self, name: &str) -> Result<Value, CoerceError> {
///         match name {
///             "id" => Ok(self.id.to_value()),
///             "name" => Ok(self.name.to_value()),
///             other => Err(CoerceError::new("known field", other)),
///         }
///     }
///
///     fn write_field(&mut self, name: &str, value: &Value) -> Result<(), CoerceError> {
///         match name {
///             "id" => self.id = FromValue::from_value(value)?,
///             "name" => self.name = FromValue::from_value(value)?,
///             other => return Err(CoerceError::new("known field", other)),
///         }
///         Ok(())
///     }
/// }
/// ```
///
/// The `Default` bound is the zero-argument constructor used by
/// reconstruction; unmapped fields keep their default values.
pub trait Entity: Default + Send + Sync + 'static {
    /// The identity field's type.
    type Id: ToValue + FromValue + Send + Sync + 'static;

    /// Declarative metadata for this type. Resolved and validated once per
    /// process by [`resolve`](crate::metadata::resolve).
    fn descriptor() -> EntityDescriptor;

    /// The current identity value.
    fn id(&self) -> &Self::Id;

    /// Read one mapped field, applying its forward coercion rule.
    fn read_field(&self, name: &str) -> Result<Value, CoerceError>;

    /// Write one mapped field, applying its reverse coercion rule.
    fn write_field(&mut self, name: &str, value: &Value) -> Result<(), CoerceError>;

    /// Receive the entity's own flat document view. Generated only for
    /// types declaring a raw-view field; the default is a no-op.
    fn set_raw_view(&mut self, view: FlatMap) {
        let _ = view;
    }
}
