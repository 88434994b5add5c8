//! Model error types.

use thiserror::Error;

use crate::cache::CacheError;
use crate::filter::{FilterError, Operator};
use crate::metadata::Operation;
use crate::store::StoreError;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors surfaced by model resolution and CRUD operations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// No header row for the model name.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The control tables do not exist.
    #[error("model database tables are not configured")]
    ModelStoreNotConfigured,

    /// Malformed filter input.
    #[error("invalid model filter: {0}")]
    InvalidFilterSyntax(String),

    /// An update or delete matched more than one row and was rolled back.
    #[error("mutation affected {count} rows, at most one is allowed")]
    MultipleRowsAffected {
        /// Rows reported by the store.
        count: u64,
    },

    /// Raw query text references a global the model was not given.
    #[error("raw query references undefined global: {0}")]
    MissingGlobal(String),

    /// A range predicate without exactly two bounds.
    #[error("{operator} on '{column}' needs exactly 2 values, got {len}")]
    InvalidBoundsList {
        column: String,
        operator: Operator,
        len: usize,
    },

    /// Update with no column to set.
    #[error("nothing to update: no known fields in new values")]
    NothingToUpdate,

    /// A control row that cannot describe a model.
    #[error("invalid metadata for model {model}: {reason}")]
    InvalidMetadata { model: String, reason: String },

    /// The model's permission flag for the operation is off.
    #[error("{operation} is not permitted on model {model}")]
    PermissionDenied { model: String, operation: Operation },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Stable error code for callers that match on strings.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::ModelNotFound(_) => Some("ERRMODELNOTFOUND"),
            Self::ModelStoreNotConfigured => Some("ERRMODELNOTCONFIGURED"),
            Self::InvalidFilterSyntax(_) | Self::InvalidBoundsList { .. } => {
                Some("ERRINVALIDMODELFILTER")
            }
            Self::MultipleRowsAffected { .. } => Some("ERRMORETHAN1ROWUPDATED"),
            _ => None,
        }
    }
}

impl From<FilterError> for ModelError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidFilterSyntax { reason } => Self::InvalidFilterSyntax(reason),
        }
    }
}
