/// Errors raised by the mapping engine.
#[derive(Debug)]
pub enum MappingError {
    /// Bad or missing declarative metadata. Fatal, surfaced at resolution
    /// time and never retried.
    Configuration(String),
    /// An entity instance has no resolvable identity value.
    MissingIdentity { entity: &'static str },
    /// A stored value could not be coerced back into its field during
    /// reverse mapping. Fatal for the record it belongs to.
    Reconstruction { key: String, detail: String },
}

impl std::fmt::Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            MappingError::MissingIdentity { entity } => {
                write!(f, "Missing identity value on `{entity}`")
            }
            MappingError::Reconstruction { key, detail } => {
                write!(f, "Cannot reconstruct field `{key}`: {detail}")
            }
        }
    }
}

impl std::error::Error for MappingError {}

/// A single-value coercion failure.
///
/// Produced by the [`FromValue`](crate::value::FromValue) rules and by the
/// serialized-field codec; the document layer wraps it with the field key it
/// belongs to.
#[derive(Debug, Clone)]
pub struct CoerceError {
    pub expected: &'static str,
    pub found: String,
}

impl CoerceError {
    pub fn new(expected: &'static str, found: impl Into<String>) -> Self {
        Self {
            expected,
            found: found.into(),
        }
    }
}

impl std::fmt::Display for CoerceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for CoerceError {}
