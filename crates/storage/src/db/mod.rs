//! Relational store: a sea-orm session plus a pending-operation buffer,
//! the unit of work. Nothing is durable until `save` commits the whole
//! buffer in one transaction.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use configs::AppConfig;
use migration::MigratorTrait;
use models::{AnyEntity, EntityKind};

use crate::engine::StorageEngine;
use crate::errors::StorageError;

pub(crate) mod entities;
mod map;

use entities::{amenity, city, place, place_amenity, review, state, user};

fn db_err(e: sea_orm::DbErr) -> StorageError {
    StorageError::Persistence(e.to_string())
}

enum Pending {
    Upsert(AnyEntity),
    Delete(EntityKind, String),
}

pub struct DbStore {
    db: DatabaseConnection,
    pending: Mutex<Vec<Pending>>,
}

impl DbStore {
    /// Connect and establish the schema (create tables if absent). In the
    /// test environment every table is dropped and recreated first;
    /// destructive, gated behind the explicit `STAYBOOK_ENV=test` opt-in.
    pub async fn connect(cfg: &AppConfig) -> Result<Self, StorageError> {
        let mut opts = ConnectOptions::new(cfg.database.connection_url());
        opts.max_connections(cfg.database.max_connections)
            .min_connections(cfg.database.min_connections)
            .connect_timeout(Duration::from_secs(cfg.database.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(cfg.database.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(cfg.database.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(cfg.database.max_lifetime_secs))
            .sqlx_logging(cfg.database.sqlx_logging);
        let db = Database::connect(opts).await.map_err(db_err)?;
        if cfg.environment.is_test() {
            warn!("test environment: dropping all tables before use");
            migration::Migrator::fresh(&db).await.map_err(db_err)?;
        } else {
            migration::Migrator::up(&db, None).await.map_err(db_err)?;
        }
        info!("database schema ready");
        Ok(Self { db, pending: Mutex::new(Vec::new()) })
    }
}

async fn upsert(txn: &DatabaseTransaction, entity: &AnyEntity) -> Result<(), sea_orm::DbErr> {
    match entity {
        AnyEntity::State(s) => {
            let am = map::state_active(s);
            if state::Entity::find_by_id(s.meta.id.clone()).one(txn).await?.is_some() {
                am.update(txn).await?;
            } else {
                am.insert(txn).await?;
            }
        }
        AnyEntity::City(c) => {
            let am = map::city_active(c);
            if city::Entity::find_by_id(c.meta.id.clone()).one(txn).await?.is_some() {
                am.update(txn).await?;
            } else {
                am.insert(txn).await?;
            }
        }
        AnyEntity::User(u) => {
            let am = map::user_active(u);
            if user::Entity::find_by_id(u.meta.id.clone()).one(txn).await?.is_some() {
                am.update(txn).await?;
            } else {
                am.insert(txn).await?;
            }
        }
        AnyEntity::Amenity(a) => {
            let am = map::amenity_active(a);
            if amenity::Entity::find_by_id(a.meta.id.clone()).one(txn).await?.is_some() {
                am.update(txn).await?;
            } else {
                am.insert(txn).await?;
            }
        }
        AnyEntity::Place(p) => {
            let am = map::place_active(p);
            if place::Entity::find_by_id(p.meta.id.clone()).one(txn).await?.is_some() {
                am.update(txn).await?;
            } else {
                am.insert(txn).await?;
            }
            // the link table mirrors the place's amenity id list exactly
            place_amenity::Entity::delete_many()
                .filter(place_amenity::Column::PlaceId.eq(p.meta.id.clone()))
                .exec(txn)
                .await?;
            let rows = map::amenity_link_rows(p);
            if !rows.is_empty() {
                place_amenity::Entity::insert_many(rows).exec(txn).await?;
            }
        }
        AnyEntity::Review(r) => {
            let am = map::review_active(r);
            if review::Entity::find_by_id(r.meta.id.clone()).one(txn).await?.is_some() {
                am.update(txn).await?;
            } else {
                am.insert(txn).await?;
            }
        }
    }
    Ok(())
}

/// Row deletion; dependents go with it via the schema's `ON DELETE
/// CASCADE`, matching the file backend's manual cascade.
async fn delete_row(
    txn: &DatabaseTransaction,
    kind: EntityKind,
    id: &str,
) -> Result<(), sea_orm::DbErr> {
    let id = id.to_string();
    match kind {
        EntityKind::State => {
            state::Entity::delete_by_id(id).exec(txn).await?;
        }
        EntityKind::City => {
            city::Entity::delete_by_id(id).exec(txn).await?;
        }
        EntityKind::User => {
            user::Entity::delete_by_id(id).exec(txn).await?;
        }
        EntityKind::Amenity => {
            amenity::Entity::delete_by_id(id).exec(txn).await?;
        }
        EntityKind::Place => {
            place::Entity::delete_by_id(id).exec(txn).await?;
        }
        EntityKind::Review => {
            review::Entity::delete_by_id(id).exec(txn).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl StorageEngine for DbStore {
    async fn new(&self, entity: AnyEntity) -> Result<(), StorageError> {
        self.pending.lock().await.push(Pending::Upsert(entity));
        Ok(())
    }

    async fn delete(&self, entity: &AnyEntity) -> Result<(), StorageError> {
        self.pending
            .lock()
            .await
            .push(Pending::Delete(entity.kind(), entity.id().to_string()));
        Ok(())
    }

    /// Commit the unit of work. All-or-nothing: any failure rolls the
    /// whole transaction back and keeps the pending buffer so the caller
    /// decides whether to retry.
    async fn save(&self) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin().await.map_err(db_err)?;
        for op in pending.iter() {
            let applied = match op {
                Pending::Upsert(entity) => upsert(&txn, entity).await,
                Pending::Delete(kind, id) => delete_row(&txn, *kind, id).await,
            };
            if let Err(e) = applied {
                // dropping the transaction rolls it back
                warn!(error = %e, "unit of work failed; rolled back");
                return Err(db_err(e));
            }
        }
        txn.commit().await.map_err(db_err)?;
        debug!(ops = pending.len(), "unit of work committed");
        pending.clear();
        Ok(())
    }

    async fn all(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<BTreeMap<String, AnyEntity>, StorageError> {
        let kinds: Vec<EntityKind> = match kind {
            Some(k) => vec![k],
            None => EntityKind::all().to_vec(),
        };
        // Load link rows once; places adopt their amenity id lists.
        let links: HashMap<String, Vec<String>> = if kinds.contains(&EntityKind::Place) {
            let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
            for row in place_amenity::Entity::find().all(&self.db).await.map_err(db_err)? {
                grouped.entry(row.place_id).or_default().push(row.amenity_id);
            }
            for ids in grouped.values_mut() {
                ids.sort();
            }
            grouped
        } else {
            HashMap::new()
        };
        let mut out = BTreeMap::new();
        for k in kinds {
            match k {
                EntityKind::User => {
                    for row in user::Entity::find().all(&self.db).await.map_err(db_err)? {
                        let e = AnyEntity::User(map::user_from_row(row));
                        out.insert(e.storage_key(), e);
                    }
                }
                EntityKind::State => {
                    for row in state::Entity::find().all(&self.db).await.map_err(db_err)? {
                        let e = AnyEntity::State(map::state_from_row(row));
                        out.insert(e.storage_key(), e);
                    }
                }
                EntityKind::City => {
                    for row in city::Entity::find().all(&self.db).await.map_err(db_err)? {
                        let e = AnyEntity::City(map::city_from_row(row));
                        out.insert(e.storage_key(), e);
                    }
                }
                EntityKind::Amenity => {
                    for row in amenity::Entity::find().all(&self.db).await.map_err(db_err)? {
                        let e = AnyEntity::Amenity(map::amenity_from_row(row));
                        out.insert(e.storage_key(), e);
                    }
                }
                EntityKind::Place => {
                    for row in place::Entity::find().all(&self.db).await.map_err(db_err)? {
                        let ids = links.get(&row.id).cloned().unwrap_or_default();
                        let e = AnyEntity::Place(map::place_from_row(row, ids));
                        out.insert(e.storage_key(), e);
                    }
                }
                EntityKind::Review => {
                    for row in review::Entity::find().all(&self.db).await.map_err(db_err)? {
                        let e = AnyEntity::Review(map::review_from_row(row));
                        out.insert(e.storage_key(), e);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Re-establish the schema; create-if-absent makes this idempotent.
    async fn reload(&self) -> Result<(), StorageError> {
        migration::Migrator::up(&self.db, None).await.map_err(db_err)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.db.clone().close().await.map_err(db_err)
    }
}
