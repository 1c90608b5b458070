/// Errors that can occur in the data layer.
///
/// "Not found" is not an error here: lookups return `Option` and deletes
/// return `bool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// A uniqueness rule rejected the write.
    Conflict(String),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Conflict(msg) => write!(f, "Conflict: {msg}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<DataError> for corral_core::HttpError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Conflict(msg) => corral_core::HttpError::Conflict(msg),
        }
    }
}
