use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("field has wrong shape: {field}")]
    WrongShape { field: &'static str },
    #[error("password hash error: {0}")]
    Hash(String),
}
