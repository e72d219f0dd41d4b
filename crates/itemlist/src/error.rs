//! Error types for list building.

use thiserror::Error;

/// Errors raised while building a list query.
///
/// Malformed filter *values*, missing attributes during cell resolution
/// and invalid sort tokens are not errors; they degrade to "filter
/// nothing / show nothing". Only structurally invalid requests surface
/// here.
#[derive(Debug, Error)]
pub enum ItemListError {
    /// A query parameter looked like a field lookup but does not resolve
    /// to a real field. Callers should surface this as a client error,
    /// not a server fault.
    #[error("incorrect lookup parameters: {key}")]
    IncorrectLookupParameters {
        /// The offending query-string key.
        key: String,
    },

    /// A declared filter references a field the model does not have.
    #[error("unknown filter field: {field}")]
    UnknownFilterField {
        /// The declared field name.
        field: String,
    },
}

/// Result type alias for list operations.
pub type Result<T> = std::result::Result<T, ItemListError>;
