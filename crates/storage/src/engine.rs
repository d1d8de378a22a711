use std::collections::BTreeMap;

use async_trait::async_trait;

use models::{AnyEntity, EntityKind};

use crate::errors::StorageError;

/// A named to-many relationship, presented as a live-computed view over
/// the store rather than a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Cities,
    Places,
    Reviews,
    Amenities,
}

/// Uniform persistence interface. Application code sees identical
/// pre/post-conditions regardless of which backend is bound, so the
/// shared lookups (`get`, `count`, `children_of`) are default methods
/// over `all`: one implementation, one contract.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Register an entity with the store. File backend: tracked
    /// immediately. Relational backend: buffered in the unit of work
    /// until `save`.
    async fn new(&self, entity: AnyEntity) -> Result<(), StorageError>;

    /// Make pending state durable.
    async fn save(&self) -> Result<(), StorageError>;

    /// Every tracked entity of the given kind (all kinds when `None`),
    /// keyed `"Kind.id"`.
    async fn all(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<BTreeMap<String, AnyEntity>, StorageError>;

    /// Lookup by filtering `all(kind)`; absence is `None`, never an error.
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<AnyEntity>, StorageError> {
        Ok(self
            .all(Some(kind))
            .await?
            .into_values()
            .find(|e| e.id() == id))
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize, StorageError> {
        Ok(self.all(kind).await?.len())
    }

    /// Remove an entity. Deleting an untracked object is a no-op.
    async fn delete(&self, entity: &AnyEntity) -> Result<(), StorageError>;

    /// Lifecycle hook: (re)load durable state / ensure the schema exists.
    async fn reload(&self) -> Result<(), StorageError>;

    /// Lifecycle hook: release the backend.
    async fn close(&self) -> Result<(), StorageError>;

    /// Children of `(parent_kind, parent_id)` along `relation`, computed
    /// from the store at read time. Pairings the data model does not
    /// define yield an empty list.
    async fn children_of(
        &self,
        parent_kind: EntityKind,
        parent_id: &str,
        relation: Relation,
    ) -> Result<Vec<AnyEntity>, StorageError> {
        let children = match (parent_kind, relation) {
            (EntityKind::State, Relation::Cities) => self
                .all(Some(EntityKind::City))
                .await?
                .into_values()
                .filter(|e| matches!(e, AnyEntity::City(c) if c.state_id == parent_id))
                .collect(),
            (EntityKind::City, Relation::Places) => self
                .all(Some(EntityKind::Place))
                .await?
                .into_values()
                .filter(|e| matches!(e, AnyEntity::Place(p) if p.city_id == parent_id))
                .collect(),
            (EntityKind::User, Relation::Places) => self
                .all(Some(EntityKind::Place))
                .await?
                .into_values()
                .filter(|e| matches!(e, AnyEntity::Place(p) if p.user_id == parent_id))
                .collect(),
            (EntityKind::User, Relation::Reviews) => self
                .all(Some(EntityKind::Review))
                .await?
                .into_values()
                .filter(|e| matches!(e, AnyEntity::Review(r) if r.user_id == parent_id))
                .collect(),
            (EntityKind::Place, Relation::Reviews) => self
                .all(Some(EntityKind::Review))
                .await?
                .into_values()
                .filter(|e| matches!(e, AnyEntity::Review(r) if r.place_id == parent_id))
                .collect(),
            (EntityKind::Place, Relation::Amenities) => {
                let Some(AnyEntity::Place(place)) =
                    self.get(EntityKind::Place, parent_id).await?
                else {
                    return Ok(Vec::new());
                };
                let amenities = self.all(Some(EntityKind::Amenity)).await?;
                let mut out = Vec::new();
                for id in &place.amenity_ids {
                    if let Some(a) = amenities.get(&format!("Amenity.{id}")) {
                        out.push(a.clone());
                    }
                }
                out
            }
            _ => Vec::new(),
        };
        Ok(children)
    }
}
