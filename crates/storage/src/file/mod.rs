//! File-backed object store: an in-process registry keyed `"Kind.id"`,
//! mirrored to a single JSON document on disk.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use models::{AnyEntity, Audience, EntityKind};

use crate::engine::StorageEngine;
use crate::errors::StorageError;

pub struct FileStore {
    path: PathBuf,
    objects: RwLock<HashMap<String, AnyEntity>>,
}

impl FileStore {
    /// Open a store over `path` and load whatever document is present.
    /// A missing file leaves the store empty; that is not an error.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let store = Self { path: path.into(), objects: RwLock::new(HashMap::new()) };
        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.ok();
            }
        }
        store.load().await?;
        Ok(store)
    }

    async fn load(&self) -> Result<(), StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.objects.write().await.clear();
                return Ok(());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        let raw: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))?;
        let mut rebuilt = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let Value::Object(doc) = value else {
                return Err(StorageError::Corrupt(format!("record {key} is not an object")));
            };
            let entity = AnyEntity::from_document(doc)
                .map_err(|e| StorageError::Corrupt(format!("record {key}: {e}")))?;
            rebuilt.insert(entity.storage_key(), entity);
        }
        let mut objects = self.objects.write().await;
        *objects = rebuilt;
        debug!(count = objects.len(), path = %self.path.display(), "document loaded");
        Ok(())
    }

    /// Serialize the whole registry into one document and replace the
    /// backing file atomically: write a sibling temp file, then rename
    /// over the old document. A crash mid-write never leaves a torn file.
    async fn write_document(&self) -> Result<(), StorageError> {
        let objects = self.objects.read().await;
        let mut doc = Map::new();
        for (key, entity) in objects.iter() {
            doc.insert(key.clone(), Value::Object(entity.to_document(Audience::Storage)));
        }
        let count = objects.len();
        drop(objects);
        let bytes =
            serde_json::to_vec(&doc).map_err(|e| StorageError::Persistence(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(count, path = %self.path.display(), "document saved");
        Ok(())
    }
}

/// Keys of everything that must go when `(kind, id)` goes. Mirrors the
/// relational schema's `ON DELETE CASCADE` chains: State→City→Place→Review
/// and User→Place/Review.
fn cascade_victims(
    objects: &HashMap<String, AnyEntity>,
    kind: EntityKind,
    id: &str,
) -> Vec<String> {
    let mut queue = vec![(kind, id.to_string())];
    let mut victims: Vec<String> = Vec::new();
    while let Some((kind, id)) = queue.pop() {
        for entity in objects.values() {
            let dependent = match (kind, entity) {
                (EntityKind::State, AnyEntity::City(c)) => c.state_id == id,
                (EntityKind::City, AnyEntity::Place(p)) => p.city_id == id,
                (EntityKind::User, AnyEntity::Place(p)) => p.user_id == id,
                (EntityKind::User, AnyEntity::Review(r)) => r.user_id == id,
                (EntityKind::Place, AnyEntity::Review(r)) => r.place_id == id,
                _ => false,
            };
            if dependent {
                let key = entity.storage_key();
                if !victims.contains(&key) {
                    victims.push(key);
                    queue.push((entity.kind(), entity.id().to_string()));
                }
            }
        }
    }
    victims
}

#[async_trait]
impl StorageEngine for FileStore {
    async fn new(&self, entity: AnyEntity) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.insert(entity.storage_key(), entity);
        Ok(())
    }

    async fn save(&self) -> Result<(), StorageError> {
        self.write_document().await
    }

    async fn all(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<BTreeMap<String, AnyEntity>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(_, e)| kind.map_or(true, |k| e.kind() == k))
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect())
    }

    async fn delete(&self, entity: &AnyEntity) -> Result<(), StorageError> {
        {
            let mut objects = self.objects.write().await;
            if objects.remove(&entity.storage_key()).is_none() {
                return Ok(());
            }
            for key in cascade_victims(&objects, entity.kind(), entity.id()) {
                objects.remove(&key);
            }
            if entity.kind() == EntityKind::Amenity {
                // scrub the link list on the many-to-many side
                for tracked in objects.values_mut() {
                    if let AnyEntity::Place(place) = tracked {
                        place.remove_amenity(entity.id());
                    }
                }
            }
            debug!(key = %entity.storage_key(), "deleted with cascade");
        }
        self.write_document().await
    }

    async fn reload(&self) -> Result<(), StorageError> {
        self.load().await
    }

    /// Flush on close so tracked-but-unsaved objects are never dropped.
    async fn close(&self) -> Result<(), StorageError> {
        self.write_document().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{Amenity, City, Place, Review, State, User};
    use std::path::PathBuf;

    fn temp_store(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("staybook_{tag}_{}.json", uuid::Uuid::new_v4()))
    }

    async fn seed_graph(store: &FileStore) -> (State, City, User, Place, Review) {
        let state = State::new("California").unwrap();
        let city = City::new(&state.meta.id, "San Francisco").unwrap();
        let user = User::new("owner@example.com", "long-enough-pw", None, None).unwrap();
        let mut place = Place::new(&city.meta.id, &user.meta.id, "Painted Lady").unwrap();
        place.price_by_night = 250;
        let review = Review::new(&place.meta.id, &user.meta.id, "Lovely").unwrap();
        for e in [
            AnyEntity::State(state.clone()),
            AnyEntity::City(city.clone()),
            AnyEntity::User(user.clone()),
            AnyEntity::Place(place.clone()),
            AnyEntity::Review(review.clone()),
        ] {
            store.new(e).await.unwrap();
        }
        store.save().await.unwrap();
        (state, city, user, place, review)
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let path = temp_store("missing");
        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_then_reload_reproduces_the_tracked_set() {
        let path = temp_store("roundtrip");
        let store = FileStore::open(&path).await.unwrap();
        let (state, _, user, place, _) = seed_graph(&store).await;

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.count(None).await.unwrap(), 5);
        let got = reopened
            .get(EntityKind::State, &state.meta.id)
            .await
            .unwrap()
            .expect("state survives restart");
        assert_eq!(got, AnyEntity::State(state));
        let got_place = reopened
            .get(EntityKind::Place, &place.meta.id)
            .await
            .unwrap()
            .expect("place survives restart");
        assert_eq!(got_place, AnyEntity::Place(place));
        // password hash survives the storage round trip
        let got_user = reopened
            .get(EntityKind::User, &user.meta.id)
            .await
            .unwrap()
            .expect("user survives restart");
        assert_eq!(got_user, AnyEntity::User(user));

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn corrupt_document_is_a_distinct_error() {
        let path = temp_store("corrupt");
        fs::write(&path, b"{not json").await.unwrap();
        match FileStore::open(&path).await {
            Err(StorageError::Corrupt(_)) => {}
            Err(other) => panic!("expected Corrupt, got {other}"),
            Ok(_) => panic!("expected Corrupt, got a working store"),
        }
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn deleting_a_state_cascades_to_the_whole_subtree() {
        let path = temp_store("cascade");
        let store = FileStore::open(&path).await.unwrap();
        let (state, city, _, place, review) = seed_graph(&store).await;

        store.delete(&AnyEntity::State(state.clone())).await.unwrap();

        assert!(store.get(EntityKind::City, &city.meta.id).await.unwrap().is_none());
        assert!(store.get(EntityKind::Place, &place.meta.id).await.unwrap().is_none());
        assert!(store.get(EntityKind::Review, &review.meta.id).await.unwrap().is_none());
        // the user does not hang off the state; it stays
        assert_eq!(store.count(Some(EntityKind::User)).await.unwrap(), 1);

        // cascade is durable across a reload
        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.count(Some(EntityKind::City)).await.unwrap(), 0);
        assert_eq!(reopened.count(Some(EntityKind::Review)).await.unwrap(), 0);

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_places_and_reviews() {
        let path = temp_store("user_cascade");
        let store = FileStore::open(&path).await.unwrap();
        let (_, _, user, place, review) = seed_graph(&store).await;

        store.delete(&AnyEntity::User(user)).await.unwrap();

        assert!(store.get(EntityKind::Place, &place.meta.id).await.unwrap().is_none());
        assert!(store.get(EntityKind::Review, &review.meta.id).await.unwrap().is_none());
        assert_eq!(store.count(Some(EntityKind::State)).await.unwrap(), 1);

        let _ = fs::remove_file(&store.path).await;
    }

    #[tokio::test]
    async fn deleting_an_untracked_object_is_a_noop() {
        let path = temp_store("noop");
        let store = FileStore::open(&path).await.unwrap();
        seed_graph(&store).await;
        let stranger = State::new("Atlantis").unwrap();
        store.delete(&AnyEntity::State(stranger)).await.unwrap();
        assert_eq!(store.count(None).await.unwrap(), 5);
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn deleting_an_amenity_scrubs_place_link_lists() {
        let path = temp_store("amenity");
        let store = FileStore::open(&path).await.unwrap();
        let (_, city, user, _, _) = seed_graph(&store).await;

        let wifi = Amenity::new("Wifi").unwrap();
        let mut place = Place::new(&city.meta.id, &user.meta.id, "Annex").unwrap();
        place.add_amenity(&wifi.meta.id);
        store.new(AnyEntity::Amenity(wifi.clone())).await.unwrap();
        store.new(AnyEntity::Place(place.clone())).await.unwrap();
        store.save().await.unwrap();

        store.delete(&AnyEntity::Amenity(wifi)).await.unwrap();

        let got = store.get(EntityKind::Place, &place.meta.id).await.unwrap().unwrap();
        let AnyEntity::Place(got) = got else { panic!("expected a place") };
        assert!(got.amenity_ids.is_empty());

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn save_replaces_atomically_and_leaves_no_temp_file() {
        let path = temp_store("atomic");
        let store = FileStore::open(&path).await.unwrap();
        seed_graph(&store).await;
        assert!(fs::metadata(&path).await.is_ok());
        assert!(fs::metadata(path.with_extension("tmp")).await.is_err());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn close_flushes_tracked_objects() {
        let path = temp_store("close");
        let store = FileStore::open(&path).await.unwrap();
        store
            .new(AnyEntity::State(State::new("Oregon").unwrap()))
            .await
            .unwrap();
        // no explicit save
        store.close().await.unwrap();
        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.count(Some(EntityKind::State)).await.unwrap(), 1);
        let _ = fs::remove_file(&path).await;
    }
}
