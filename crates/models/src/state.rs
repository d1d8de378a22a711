use crate::codec::{self, Audience, Document};
use crate::errors::ModelError;
use crate::meta::Meta;

/// Top of the geography tree; owns cities (cascade on delete).
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub meta: Meta,
    pub name: String,
}

impl State {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn round_trip_keeps_id_and_fields() {
        let s = State::new("California").unwrap();
        let rebuilt = State::from_document(s.to_document(Audience::Storage)).unwrap();
        assert_eq!(s, rebuilt);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let s = State::new("Nevada").unwrap();
        let mut doc = s.to_document(Audience::Storage);
        doc.insert("mystery".into(), Value::String("ignored".into()));
        let rebuilt = State::from_document(doc).unwrap();
        assert_eq!(s, rebuilt);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(State::new("  ").is_err());
    }
}
