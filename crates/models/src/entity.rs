use std::fmt;

use serde_json::Value;

use crate::codec::{Audience, Document, TYPE_KEY};
use crate::errors::ModelError;
use crate::meta::Meta;
use crate::{Amenity, City, Place, Review, State, User};

/// The type marker: names a concrete entity type in storage keys and in
/// serialized documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "User" => Ok(EntityKind::User),
            "State" => Ok(EntityKind::State),
            "City" => Ok(EntityKind::City),
            "Amenity" => Ok(EntityKind::Amenity),
            "Place" => Ok(EntityKind::Place),
            "Review" => Ok(EntityKind::Review),
            other => Err(ModelError::UnknownKind(other.to_string())),
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::User,
            EntityKind::State,
            EntityKind::City,
            EntityKind::Amenity,
            EntityKind::Place,
            EntityKind::Review,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed union over the six concrete entities; what the storage layer
/// tracks, serializes, and returns.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEntity {
    User(User),
    State(State),
    City(City),
    Amenity(Amenity),
    Place(Place),
    Review(Review),
}

impl AnyEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyEntity::User(_) => EntityKind::User,
            AnyEntity::State(_) => EntityKind::State,
            AnyEntity::City(_) => EntityKind::City,
            AnyEntity::Amenity(_) => EntityKind::Amenity,
            AnyEntity::Place(_) => EntityKind::Place,
            AnyEntity::Review(_) => EntityKind::Review,
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            AnyEntity::User(e) => &e.meta,
            AnyEntity::State(e) => &e.meta,
            AnyEntity::City(e) => &e.meta,
            AnyEntity::Amenity(e) => &e.meta,
            AnyEntity::Place(e) => &e.meta,
            AnyEntity::Review(e) => &e.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        match self {
            AnyEntity::User(e) => &mut e.meta,
            AnyEntity::State(e) => &mut e.meta,
            AnyEntity::City(e) => &mut e.meta,
            AnyEntity::Amenity(e) => &mut e.meta,
            AnyEntity::Place(e) => &mut e.meta,
            AnyEntity::Review(e) => &mut e.meta,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    /// Key used by both backends: `"Kind.id"`.
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.kind(), self.id())
    }

    pub fn touch(&mut self) {
        self.meta_mut().touch();
    }

    /// Serialize to a document, always carrying the type marker.
    pub fn to_document(&self, audience: Audience) -> Document {
        let mut doc = match self {
            AnyEntity::User(e) => e.to_document(audience),
            AnyEntity::State(e) => e.to_document(audience),
            AnyEntity::City(e) => e.to_document(audience),
            AnyEntity::Amenity(e) => e.to_document(audience),
            AnyEntity::Place(e) => e.to_document(audience),
            AnyEntity::Review(e) => e.to_document(audience),
        };
        doc.insert(TYPE_KEY.into(), Value::String(self.kind().as_str().into()));
        doc
    }

    /// Reconstruct from a document whose type marker names the concrete
    /// type.
    pub fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let kind = match doc.remove(TYPE_KEY) {
            Some(Value::String(s)) => EntityKind::parse(&s)?,
            Some(_) => return Err(ModelError::WrongShape { field: TYPE_KEY }),
            None => return Err(ModelError::MissingField(TYPE_KEY)),
        };
        Self::from_document_as(kind, doc)
    }

    /// Reconstruct when the caller already knows the type; a marker still
    /// present in the document is stripped, never adopted as an attribute.
    pub fn from_document_as(kind: EntityKind, doc: Document) -> Result<Self, ModelError> {
        Ok(match kind {
            EntityKind::User => AnyEntity::User(User::from_document(doc)?),
            EntityKind::State => AnyEntity::State(State::from_document(doc)?),
            EntityKind::City => AnyEntity::City(City::from_document(doc)?),
            EntityKind::Amenity => AnyEntity::Amenity(Amenity::from_document(doc)?),
            EntityKind::Place => AnyEntity::Place(Place::from_document(doc)?),
            EntityKind::Review => AnyEntity::Review(Review::from_document(doc)?),
        })
    }

    /// Bulk update from an untyped field map. Protected fields (`id`,
    /// timestamps, foreign-key identity fields) and unknown keys are
    /// silently ignored.
    pub fn apply_update(&mut self, fields: &Document) {
        match self {
            AnyEntity::User(e) => e.apply_update(fields),
            AnyEntity::State(e) => e.apply_update(fields),
            AnyEntity::City(e) => e.apply_update(fields),
            AnyEntity::Amenity(e) => e.apply_update(fields),
            AnyEntity::Place(e) => e.apply_update(fields),
            AnyEntity::Review(e) => e.apply_update(fields),
        }
    }
}

impl fmt::Display for AnyEntity {
    /// `[Kind] (id) {public fields}`, the redacted form, safe for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut doc = self.to_document(Audience::Public);
        doc.remove(TYPE_KEY);
        write!(f, "[{}] ({}) {}", self.kind(), self.id(), Value::Object(doc))
    }
}

impl From<User> for AnyEntity {
    fn from(e: User) -> Self {
        AnyEntity::User(e)
    }
}

impl From<State> for AnyEntity {
    fn from(e: State) -> Self {
        AnyEntity::State(e)
    }
}

impl From<City> for AnyEntity {
    fn from(e: City) -> Self {
        AnyEntity::City(e)
    }
}

impl From<Amenity> for AnyEntity {
    fn from(e: Amenity) -> Self {
        AnyEntity::Amenity(e)
    }
}

impl From<Place> for AnyEntity {
    fn from(e: Place) -> Self {
        AnyEntity::Place(e)
    }
}

impl From<Review> for AnyEntity {
    fn from(e: Review) -> Self {
        AnyEntity::Review(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_round_trips() {
        for kind in EntityKind::all() {
            assert_eq!(EntityKind::parse(kind.as_str()).unwrap(), *kind);
        }
        assert!(matches!(
            EntityKind::parse("Booking"),
            Err(ModelError::UnknownKind(_))
        ));
    }

    #[test]
    fn document_carries_marker_and_round_trips() {
        let entity: AnyEntity = State::new("Oregon").unwrap().into();
        let doc = entity.to_document(Audience::Storage);
        assert_eq!(
            doc.get(TYPE_KEY).and_then(|v| v.as_str()),
            Some("State")
        );
        let rebuilt = AnyEntity::from_document(doc).unwrap();
        assert_eq!(entity, rebuilt);
        assert_eq!(entity.id(), rebuilt.id());
    }

    #[test]
    fn storage_key_is_kind_dot_id() {
        let entity: AnyEntity = Amenity::new("Wifi").unwrap().into();
        assert_eq!(entity.storage_key(), format!("Amenity.{}", entity.id()));
    }

    #[test]
    fn missing_marker_is_an_error() {
        let doc = State::new("Utah").unwrap().to_document(Audience::Storage);
        assert!(matches!(
            AnyEntity::from_document(doc),
            Err(ModelError::MissingField(TYPE_KEY))
        ));
    }

    #[test]
    fn display_redacts_password() {
        let user = User::new("sue@example.com", "super-secret-pw", None, None).unwrap();
        let hash = user.password_hash().to_string();
        let entity: AnyEntity = user.into();
        let shown = entity.to_string();
        assert!(shown.starts_with("[User]"));
        assert!(!shown.contains("password"));
        assert!(!shown.contains(&hash));
    }

    #[test]
    fn reconstruction_does_not_mint_new_id() {
        let entity: AnyEntity = Review::new("place-1", "user-1", "Great stay").unwrap().into();
        let rebuilt = AnyEntity::from_document(entity.to_document(Audience::Storage)).unwrap();
        assert_eq!(entity.id(), rebuilt.id());
        assert_eq!(entity.meta(), rebuilt.meta());
    }
}
