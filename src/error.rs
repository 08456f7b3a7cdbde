use crate::validation::ValidationError;

/// Errors raised by [`crate::store::FeatureStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No feature with this id ({id}), can not {operation}")]
    NotFound { id: String, operation: &'static str },

    #[error("Feature {id} failed validation: {source}")]
    InvalidFeature {
        id: String,
        #[source]
        source: ValidationError,
    },

    #[error("Feature {id} is not valid: {contents}")]
    RejectedFeature { id: String, contents: String },

    #[error("Feature {id} could not be stored: {reason}")]
    MalformedFeature { id: String, reason: String },
}

impl StoreError {
    /// The enumerated validation reason behind this error, if any.
    pub fn validation_reason(&self) -> Option<ValidationError> {
        match self {
            StoreError::InvalidFeature { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
