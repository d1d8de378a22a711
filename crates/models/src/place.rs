use crate::codec::{self, Audience, Document};
use crate::errors::ModelError;
use crate::meta::Meta;

/// A rentable listing. Belongs to a City and a User; owns reviews
/// (cascade on delete) and links to amenities through `amenity_ids`,
/// the one persisted relationship list in the data model.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub meta: Meta,
    pub city_id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub number_rooms: i32,
    pub number_bathrooms: i32,
    pub max_guest: i32,
    pub price_by_night: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenity_ids: Vec<String>,
}

impl Place {
    pub fn new(city_id: &str, user_id: &str, name: &str) -> Result<Self, ModelError> {
        if name.trim().is_empty() {
            return Err(ModelError::Validation("name required".into()));
        }
        if city_id.trim().is_empty() || user_id.trim().is_empty() {
            return Err(ModelError::Validation("city_id and user_id required".into()));
        }
        Ok(Self {
            meta: Meta::generate(),
            city_id: city_id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
        })
    }

    /// Link an amenity; duplicates are collapsed.
    pub fn add_amenity(&mut self, amenity_id: &str) {
        if !self.amenity_ids.iter().any(|id| id == amenity_id) {
            self.amenity_ids.push(amenity_id.to_string());
        }
    }

    pub fn remove_amenity(&mut self, amenity_id: &str) {
        self.amenity_ids.retain(|id| id != amenity_id);
    }

    pub(crate) fn to_document(&self, _audience: Audience) -> Document {
        let mut doc = Document::new();
        codec::write_meta(&mut doc, &self.meta);
        codec::put_string(&mut doc, "city_id", &self.city_id);
        codec::put_string(&mut doc, "user_id", &self.user_id);
        codec::put_string(&mut doc, "name", &self.name);
        codec::put_opt_string(&mut doc, "description", &self.description);
        codec::put_i32(&mut doc, "number_rooms", self.number_rooms);
        codec::put_i32(&mut doc, "number_bathrooms", self.number_bathrooms);
        codec::put_i32(&mut doc, "max_guest", self.max_guest);
        codec::put_i32(&mut doc, "price_by_night", self.price_by_night);
        codec::put_opt_f64(&mut doc, "latitude", &self.latitude);
        codec::put_opt_f64(&mut doc, "longitude", &self.longitude);
        codec::put_string_list(&mut doc, "amenity_ids", &self.amenity_ids);
        doc
    }

    pub(crate) fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let meta = codec::take_meta(&mut doc)?;
        let city_id = codec::require_string(&mut doc, "city_id")?;
        let user_id = codec::require_string(&mut doc, "user_id")?;
        let name = codec::require_string(&mut doc, "name")?;
        let description = codec::take_string(&mut doc, "description")?;
        let number_rooms = codec::take_i32(&mut doc, "number_rooms")?.unwrap_or(0);
        let number_bathrooms = codec::take_i32(&mut doc, "number_bathrooms")?.unwrap_or(0);
        let max_guest = codec::take_i32(&mut doc, "max_guest")?.unwrap_or(0);
        let price_by_night = codec::take_i32(&mut doc, "price_by_night")?.unwrap_or(0);
        let latitude = codec::take_f64(&mut doc, "latitude")?;
        let longitude = codec::take_f64(&mut doc, "longitude")?;
        let amenity_ids = codec::take_string_list(&mut doc, "amenity_ids")?.unwrap_or_default();
        Ok(Self {
            meta,
            city_id,
            user_id,
            name,
            description,
            number_rooms,
            number_bathrooms,
            max_guest,
            price_by_night,
            latitude,
            longitude,
            amenity_ids,
        })
    }

    /// `city_id` and `user_id` are foreign-key identity fields; the bulk
    /// path never touches them.
    pub(crate) fn apply_update(&mut self, fields: &Document) {
        for (key, value) in fields {
            match key.as_str() {
                "name" => {
                    if let Some(v) = value.as_str() {
                        self.name = v.to_string();
                    }
                }
                "description" => {
                    if let Some(v) = value.as_str() {
                        self.description = Some(v.to_string());
                    }
                }
                "number_rooms" => {
                    if let Some(v) = value.as_i64() {
                        self.number_rooms = v as i32;
                    }
                }
                "number_bathrooms" => {
                    if let Some(v) = value.as_i64() {
                        self.number_bathrooms = v as i32;
                    }
                }
                "max_guest" => {
                    if let Some(v) = value.as_i64() {
                        self.max_guest = v as i32;
                    }
                }
                "price_by_night" => {
                    if let Some(v) = value.as_i64() {
                        self.price_by_night = v as i32;
                    }
                }
                "latitude" => {
                    if let Some(v) = value.as_f64() {
                        self.latitude = Some(v);
                    }
                }
                "longitude" => {
                    if let Some(v) = value.as_f64() {
                        self.longitude = Some(v);
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Place {
        let mut p = Place::new("city-1", "user-1", "Loft downtown").unwrap();
        p.description = Some("Bright corner unit".into());
        p.number_rooms = 2;
        p.max_guest = 4;
        p.price_by_night = 120;
        p.latitude = Some(37.7749);
        p.longitude = Some(-122.4194);
        p.add_amenity("wifi-id");
        p.add_amenity("parking-id");
        p
    }

    #[test]
    fn round_trip_preserves_everything() {
        let p = sample();
        let rebuilt = Place::from_document(p.to_document(Audience::Storage)).unwrap();
        assert_eq!(p, rebuilt);
    }

    #[test]
    fn add_amenity_deduplicates() {
        let mut p = sample();
        p.add_amenity("wifi-id");
        assert_eq!(p.amenity_ids, vec!["wifi-id", "parking-id"]);
        p.remove_amenity("wifi-id");
        assert_eq!(p.amenity_ids, vec!["parking-id"]);
    }

    #[test]
    fn numeric_defaults_backfill_on_reconstruction() {
        let minimal: Document = serde_json::from_str(
            r#"{"city_id": "c", "user_id": "u", "name": "Cabin"}"#,
        )
        .unwrap();
        let p = Place::from_document(minimal).unwrap();
        assert_eq!(p.number_rooms, 0);
        assert_eq!(p.price_by_night, 0);
        assert!(p.amenity_ids.is_empty());
    }

    #[test]
    fn update_ignores_foreign_keys() {
        let mut p = sample();
        let fields: Document = serde_json::from_str(
            r#"{"city_id": "other-city", "user_id": "other-user", "price_by_night": 99}"#,
        )
        .unwrap();
        p.apply_update(&fields);
        assert_eq!(p.city_id, "city-1");
        assert_eq!(p.user_id, "user-1");
        assert_eq!(p.price_by_night, 99);
    }
}
