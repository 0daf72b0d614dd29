use thiserror::Error;

/// Errors surfaced to callers of the recommender operations.
///
/// Each variant maps onto its own transport status, so a client can tell
/// malformed input from an empty match from a model that could not serve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Required input missing or malformed. `fields` names every offending field.
    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    /// Well-formed query with nothing to report.
    #[error("{0}")]
    NotFound(String),

    /// The predictor rejected well-formed input.
    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Validation failure for a single field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            fields: vec![field.to_string()],
        }
    }

    /// Validation failure listing every missing field.
    pub fn missing_fields(fields: Vec<String>) -> Self {
        ServiceError::Validation {
            message: format!("Missing fields: {}", fields.join(", ")),
            fields,
        }
    }

    /// Validation failure listing fields that are present but malformed.
    pub fn invalid_fields(fields: Vec<String>) -> Self {
        ServiceError::Validation {
            message: format!("Invalid fields: {}", fields.join(", ")),
            fields,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation { .. } => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Prediction(_) => "prediction",
            ServiceError::Internal(_) => "internal",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_names_all_fields() {
        let err = ServiceError::missing_fields(vec!["branch".into(), "gender".into()]);
        assert_eq!(err.to_string(), "Missing fields: branch, gender");
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn prediction_errors_are_prefixed() {
        let err = ServiceError::Prediction("unknown category".into());
        assert_eq!(err.to_string(), "prediction failed: unknown category");
    }
}
