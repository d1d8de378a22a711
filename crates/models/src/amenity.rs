use crate::codec::{self, Audience, Document};
use crate::errors::ModelError;
use crate::meta::Meta;

/// Many-to-many with Place via the place-side amenity id list (file
/// backend) or the link table (relational backend).
#[derive(Debug, Clone, PartialEq)]
pub struct Amenity {
    pub meta: Meta,
    pub name: String,
}

impl Amenity {
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name.trim().is_empty() {
            return Err(ModelError::Validation("name required".into()));
        }
        Ok(Self { meta: Meta::generate(), name: name.to_string() })
    }

    pub(crate) fn to_document(&self, _audience: Audience) -> Document {
        let mut doc = Document::new();
        codec::write_meta(&mut doc, &self.meta);
        codec::put_string(&mut doc, "name", &self.name);
        doc
    }

    pub(crate) fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let meta = codec::take_meta(&mut doc)?;
        let name = codec::require_string(&mut doc, "name")?;
        Ok(Self { meta, name })
    }

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
