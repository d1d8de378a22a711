use crate::codec::{self, Audience, Document};
use crate::errors::ModelError;
use crate::meta::Meta;

/// Belongs to a Place and a User; leaf of the cascade tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub meta: Meta,
    pub place_id: String,
    pub user_id: String,
    pub text: String,
}

impl Review {
    pub fn new(place_id: &str, user_id: &str, text: &str) -> Result<Self, ModelError> {
        if text.trim().is_empty() {
            return Err(ModelError::Validation("text required".into()));
        }
        if place_id.trim().is_empty() || user_id.trim().is_empty() {
            return Err(ModelError::Validation("place_id and user_id required".into()));
        }
        Ok(Self {
            meta: Meta::generate(),
            place_id: place_id.to_string(),
            user_id: user_id.to_string(),
            text: text.to_string(),
        })
    }

    pub(crate) fn to_document(&self, _audience: Audience) -> Document {
        let mut doc = Document::new();
        codec::write_meta(&mut doc, &self.meta);
        codec::put_string(&mut doc, "place_id", &self.place_id);
        codec::put_string(&mut doc, "user_id", &self.user_id);
        codec::put_string(&mut doc, "text", &self.text);
        doc
    }

    pub(crate) fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let meta = codec::take_meta(&mut doc)?;
        let place_id = codec::require_string(&mut doc, "place_id")?;
        let user_id = codec::require_string(&mut doc, "user_id")?;
        let text = codec::require_string(&mut doc, "text")?;
        Ok(Self { meta, place_id, user_id, text })
    }

    pub(crate) fn apply_update(&mut self, fields: &Document) {
        for (key, value) in fields {
            if key == "text" {
                if let Some(v) = value.as_str() {
                    self.text = v.to_string();
                }
            }
        }
    }
}
