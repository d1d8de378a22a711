//! staybook: a lodging web-application data layer. Six domain entities,
//! two interchangeable persistence backends (JSON document store and
//! Postgres), one storage facade bound at process start.

use anyhow::Result;

pub use configs::{AppConfig, BackendKind, Environment};
pub use models::{
    Amenity, AnyEntity, Audience, City, Document, EntityKind, Meta, ModelError, Place, Review,
    State, User, TYPE_KEY,
};
pub use storage::{DbStore, FileStore, Relation, Storage, StorageEngine, StorageError};

/// Bind the persistence backend once at process start and hand back the
/// facade for injection. The binding never changes afterwards.
pub async fn init_storage(cfg: &AppConfig) -> Result<Storage> {
    if cfg.storage.backend == BackendKind::File {
        common::env::ensure_data_dir(&cfg.storage.file_path).await?;
    }
    let storage = Storage::from_config(cfg).await?;
    Ok(storage)
}

/// Convenience bootstrap: initialize logging, load and validate
/// configuration, bind storage.
pub async fn bootstrap() -> Result<Storage> {
    common::utils::logging::init_logging_default();
    let cfg = AppConfig::load_and_validate()?;
    init_storage(&cfg).await
}
