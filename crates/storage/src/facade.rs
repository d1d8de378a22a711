//! The storage facade: one process-wide persistence binding, selected
//! from configuration at startup and injected into whatever needs it.
//! The backend never changes for the lifetime of the process.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use configs::{AppConfig, BackendKind};
use models::{AnyEntity, Document, EntityKind};

use crate::db::DbStore;
use crate::engine::{Relation, StorageEngine};
use crate::errors::StorageError;
use crate::file::FileStore;

#[derive(Clone)]
pub struct Storage {
    backend: BackendKind,
    engine: Arc<dyn StorageEngine>,
}

impl Storage {
    /// Bind to exactly one backend based on configuration. File backend:
    /// opens the document store. Relational backend: connects and
    /// establishes the schema.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, StorageError> {
        let storage = match cfg.storage.backend {
            BackendKind::File => {
                let engine = FileStore::open(&cfg.storage.file_path).await?;
                Self { backend: BackendKind::File, engine: Arc::new(engine) }
            }
            BackendKind::Db => {
                let engine = DbStore::connect(cfg).await?;
                Self { backend: BackendKind::Db, engine: Arc::new(engine) }
            }
        };
        info!(backend = storage.backend.as_str(), "storage backend bound");
        Ok(storage)
    }

    /// Wrap an already-built engine; tests use this to drive one backend
    /// directly.
    pub fn with_engine(backend: BackendKind, engine: Arc<dyn StorageEngine>) -> Self {
        Self { backend, engine }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Register an entity with the active store.
    pub async fn new(&self, entity: &AnyEntity) -> Result<(), StorageError> {
        debug!(key = %entity.storage_key(), "register");
        self.engine.new(entity.clone()).await
    }

    /// Commit pending state.
    pub async fn save(&self) -> Result<(), StorageError> {
        self.engine.save().await
    }

    /// Typed lookup; absence is `None`, never an error.
    pub async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<AnyEntity>, StorageError> {
        self.engine.get(kind, id).await
    }

    pub async fn all(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<BTreeMap<String, AnyEntity>, StorageError> {
        self.engine.all(kind).await
    }

    pub async fn count(&self, kind: Option<EntityKind>) -> Result<usize, StorageError> {
        self.engine.count(kind).await
    }

    /// Remove an entity; dependents cascade identically on both backends.
    pub async fn delete(&self, entity: &AnyEntity) -> Result<(), StorageError> {
        debug!(key = %entity.storage_key(), "delete");
        self.engine.delete(entity).await
    }

    pub async fn reload(&self) -> Result<(), StorageError> {
        self.engine.reload().await
    }

    pub async fn close(&self) -> Result<(), StorageError> {
        self.engine.close().await
    }

    /// Live-computed relationship view, identical on both backends.
    pub async fn children_of(
        &self,
        parent_kind: EntityKind,
        parent_id: &str,
        relation: Relation,
    ) -> Result<Vec<AnyEntity>, StorageError> {
        self.engine.children_of(parent_kind, parent_id, relation).await
    }

    /// The usual write path: refresh the audit timestamp, register, and
    /// commit in one step.
    pub async fn persist(&self, entity: &mut AnyEntity) -> Result<(), StorageError> {
        entity.touch();
        self.engine.new(entity.clone()).await?;
        self.engine.save().await
    }

    /// Bulk-update then persist. Protected fields (identity, timestamps,
    /// foreign keys) are ignored by the entity layer.
    pub async fn update(
        &self,
        entity: &mut AnyEntity,
        fields: &Document,
    ) -> Result<(), StorageError> {
        entity.apply_update(fields);
        self.persist(entity).await
    }
}
