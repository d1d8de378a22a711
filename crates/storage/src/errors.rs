use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing document exists but cannot be decoded. Distinct from a
    /// missing document, which is just an empty store.
    #[error("corrupt storage document: {0}")]
    Corrupt(String),
    /// A durable write failed; for the relational backend the whole unit
    /// of work was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
