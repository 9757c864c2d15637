use plume_core::MappingError;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// A mapping-engine failure (configuration, identity, reconstruction).
    Mapping(MappingError),
    /// A backend/driver failure, passed through unreinterpreted.
    Backend(Box<dyn std::error::Error + Send + Sync>),
    /// Some items of a batched write failed; successful items stand.
    PartialFailure { failures: Vec<(String, String)> },
    Other(String),
}

impl DataError {
    /// Construct a `Backend` variant from any error type.
    ///
    /// Used by backend adapters (e.g. `plume-memory`) to wrap
    /// driver-specific errors.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Backend(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Mapping(err) => write!(f, "Mapping error: {err}"),
            DataError::Backend(err) => write!(f, "Backend error: {err}"),
            DataError::PartialFailure { failures } => {
                write!(f, "Partial batch failure ({} item(s)):", failures.len())?;
                for (id, detail) in failures {
                    write!(f, " [{id}: {detail}]")?;
                }
                Ok(())
            }
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Mapping(err) => Some(err),
            DataError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<MappingError> for DataError {
    fn from(err: MappingError) -> Self {
        DataError::Mapping(err)
    }
}
