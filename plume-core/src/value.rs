use crate::error::CoerceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A coerced field value as it appears in a document.
///
/// Backends decide whether to persist values natively or as their canonical
/// string form; the mapper only guarantees that [`Value::canonical_string`]
/// is lossless and that the [`FromValue`] rules accept it back.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Lossless canonical text form of this value.
    ///
    /// String-oriented backends persist this form; the reverse coercion
    /// rules parse it back without loss.
    pub fn canonical_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::UInt(n) => n.to_string(),
            Value::Float(n) => {
                // `{}` drops the trailing `.0` on whole floats; Ryu-style
                // shortest form keeps the round-trip lossless either way.
                let mut s = n.to_string();
                if !s.contains(&['.', 'e', 'E'][..]) && n.is_finite() {
                    s.push_str(".0");
                }
                s
            }
            Value::Str(s) => s.clone(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::UInt(_) => "UInt",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
        }
    }

    fn describe(&self) -> String {
        format!("{}({})", self.type_name(), self.canonical_string())
    }
}

/// Forward coercion rule: convert a field's runtime value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Reverse coercion rule: rebuild a field's runtime value from a [`Value`].
///
/// Implementations accept both the native variant and the canonical string
/// form, so records persisted through stringifying backends round-trip.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, CoerceError>;
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Str(s) => s
                .parse()
                .map_err(|_| CoerceError::new("boolean", value.describe())),
            other => Err(CoerceError::new("boolean", other.describe())),
        }
    }
}

macro_rules! signed_value_impls {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, CoerceError> {
                    match value {
                        Value::Int(n) => <$ty>::try_from(*n)
                            .map_err(|_| CoerceError::new(stringify!($ty), value.describe())),
                        Value::UInt(n) => <$ty>::try_from(*n)
                            .map_err(|_| CoerceError::new(stringify!($ty), value.describe())),
                        Value::Str(s) => s
                            .parse()
                            .map_err(|_| CoerceError::new(stringify!($ty), value.describe())),
                        other => Err(CoerceError::new(stringify!($ty), other.describe())),
                    }
                }
            }
        )*
    };
}

signed_value_impls!(i8, i16, i32, i64);

macro_rules! unsigned_value_impls {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::UInt(u64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, CoerceError> {
                    match value {
                        Value::UInt(n) => <$ty>::try_from(*n)
                            .map_err(|_| CoerceError::new(stringify!($ty), value.describe())),
                        Value::Int(n) => <$ty>::try_from(*n)
                            .map_err(|_| CoerceError::new(stringify!($ty), value.describe())),
                        Value::Str(s) => s
                            .parse()
                            .map_err(|_| CoerceError::new(stringify!($ty), value.describe())),
                        other => Err(CoerceError::new(stringify!($ty), other.describe())),
                    }
                }
            }
        )*
    };
}

unsigned_value_impls!(u8, u16, u32, u64);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(n) => Ok(*n),
            Value::Int(n) => Ok(*n as f64),
            Value::UInt(n) => Ok(*n as f64),
            Value::Str(s) => s
                .parse()
                .map_err(|_| CoerceError::new("f64", value.describe())),
            other => Err(CoerceError::new("f64", other.describe())),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        f64::from_value(value).map(|n| n as f32)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(CoerceError::new("string", other.describe())),
        }
    }
}

// Identity-like opaque value types map to their canonical string form.
impl ToValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Str(self.hyphenated().to_string())
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Str(s) => {
                Uuid::parse_str(s).map_err(|_| CoerceError::new("UUID string", value.describe()))
            }
            other => Err(CoerceError::new("UUID string", other.describe())),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Encode a serialized field into its stored JSON-string payload.
pub fn to_json<T: Serialize>(value: &T) -> Result<Value, CoerceError> {
    serde_json::to_string(value)
        .map(Value::Str)
        .map_err(|err| CoerceError::new("JSON-serializable value", err.to_string()))
}

/// Decode a serialized field from its stored JSON-string payload.
pub fn from_json<T: DeserializeOwned>(value: &Value) -> Result<T, CoerceError> {
    match value {
        Value::Str(raw) => serde_json::from_str(raw)
            .map_err(|err| CoerceError::new("valid JSON payload", err.to_string())),
        other => Err(CoerceError::new("JSON string", other.describe())),
    }
}
