use crate::codec::{self, Audience, Document};
use crate::errors::ModelError;
use crate::meta::Meta;

/// Belongs to a State; owns places (cascade on delete).
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub meta: Meta,
    pub state_id: String,
    pub name: String,
}

impl City {
    pub fn new(state_id: &str, name: &str) -> Result<Self, ModelError> {
        if name.trim().is_empty() {
            return Err(ModelError::Validation("name required".into()));
        }
        if state_id.trim().is_empty() {
            return Err(ModelError::Validation("state_id required".into()));
        }
        Ok(Self {
            meta: Meta::generate(),
            state_id: state_id.to_string(),
            name: name.to_string(),
        })
    }

    pub(crate) fn to_document(&self, _audience: Audience) -> Document {
        let mut doc = Document::new();
        codec::write_meta(&mut doc, &self.meta);
        codec::put_string(&mut doc, "state_id", &self.state_id);
        codec::put_string(&mut doc, "name", &self.name);
        doc
    }

    pub(crate) fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let meta = codec::take_meta(&mut doc)?;
        let state_id = codec::require_string(&mut doc, "state_id")?;
        let name = codec::require_string(&mut doc, "name")?;
        Ok(Self { meta, state_id, name })
    }

    /// `state_id` is a foreign-key identity field; the bulk path never
    /// touches it.
    pub(crate) fn apply_update(&mut self, fields: &Document) {
        for (key, value) in fields {
            if key == "name" {
                if let Some(v) = value.as_str() {
                    self.name = v.to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_cannot_move_city_between_states() {
        let mut c = City::new("state-1", "Fresno").unwrap();
        let fields: Document =
            serde_json::from_str(r#"{"state_id": "state-2", "name": "Clovis"}"#).unwrap();
        c.apply_update(&fields);
        assert_eq!(c.state_id, "state-1");
        assert_eq!(c.name, "Clovis");
    }

    #[test]
    fn round_trip_keeps_foreign_key() {
        let c = City::new("state-9", "San Jose").unwrap();
        let rebuilt = City::from_document(c.to_document(Audience::Storage)).unwrap();
        assert_eq!(c, rebuilt);
    }
}
