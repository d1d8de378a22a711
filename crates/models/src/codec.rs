//! Document codec shared by every entity.
//!
//! A document is a flat JSON map of field name to scalar/container value.
//! Reconstruction is explicit and allow-listed: each entity pulls the
//! fields it knows, unknown keys are ignored, and the type-marker key is
//! stripped so it is never adopted as a real attribute.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::meta::{self, Meta};

pub type Document = Map<String, Value>;

/// Marker key identifying which concrete entity a serialized record is.
pub const TYPE_KEY: &str = "__type__";

/// Who a serialized document is for. `Public` redacts secrets (the User
/// password hash); only the storage layer asks for `Storage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Storage,
}

pub(crate) fn write_meta(doc: &mut Document, m: &Meta) {
    doc.insert("id".into(), Value::String(m.id.clone()));
    doc.insert(
        "created_at".into(),
        Value::String(meta::format_timestamp(&m.created_at)),
    );
    doc.insert(
        "updated_at".into(),
        Value::String(meta::format_timestamp(&m.updated_at)),
    );
}

/// Pull the identity block out of a document, backfilling what is absent:
/// a missing id is minted, a missing `created_at` becomes "now", a missing
/// `updated_at` adopts `created_at` so the audit invariant cannot break.
pub(crate) fn take_meta(doc: &mut Document) -> Result<Meta, ModelError> {
    doc.remove(TYPE_KEY);
    let id = match doc.remove("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Null) | None => meta::fresh_id(),
        Some(_) => return Err(ModelError::WrongShape { field: "id" }),
    };
    let created_at = take_timestamp(doc, "created_at")?.unwrap_or_else(meta::now);
    let updated_at = take_timestamp(doc, "updated_at")?.unwrap_or(created_at);
    Ok(Meta { id, created_at, updated_at })
}

fn take_timestamp(
    doc: &mut Document,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, ModelError> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => meta::parse_timestamp(&s).map(Some),
        Some(_) => Err(ModelError::WrongShape { field }),
    }
}

pub(crate) fn take_string(
    doc: &mut Document,
    field: &'static str,
) -> Result<Option<String>, ModelError> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ModelError::WrongShape { field }),
    }
}

pub(crate) fn require_string(doc: &mut Document, field: &'static str) -> Result<String, ModelError> {
    take_string(doc, field)?.ok_or(ModelError::MissingField(field))
}

pub(crate) fn take_i32(doc: &mut Document, field: &'static str) -> Result<Option<i32>, ModelError> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(Some(v as i32)),
            None => Err(ModelError::WrongShape { field }),
        },
        Some(_) => Err(ModelError::WrongShape { field }),
    }
}

pub(crate) fn take_f64(doc: &mut Document, field: &'static str) -> Result<Option<f64>, ModelError> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => Ok(Some(v)),
            None => Err(ModelError::WrongShape { field }),
        },
        Some(_) => Err(ModelError::WrongShape { field }),
    }
}

pub(crate) fn take_string_list(
    doc: &mut Document,
    field: &'static str,
) -> Result<Option<Vec<String>>, ModelError> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s),
                    _ => return Err(ModelError::WrongShape { field }),
                }
            }
            Ok(Some(out))
        }
        Some(_) => Err(ModelError::WrongShape { field }),
    }
}

pub(crate) fn put_string(doc: &mut Document, field: &str, v: &str) {
    doc.insert(field.to_string(), Value::String(v.to_string()));
}

pub(crate) fn put_opt_string(doc: &mut Document, field: &str, v: &Option<String>) {
    let value = match v {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    };
    doc.insert(field.to_string(), value);
}

pub(crate) fn put_i32(doc: &mut Document, field: &str, v: i32) {
    doc.insert(field.to_string(), Value::Number(v.into()));
}

pub(crate) fn put_opt_f64(doc: &mut Document, field: &str, v: &Option<f64>) {
    let value = match v {
        None => Value::Null,
        // Non-finite numbers have no JSON form; fall back to display form.
        Some(x) => serde_json::Number::from_f64(*x)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(x.to_string())),
    };
    doc.insert(field.to_string(), value);
}

pub(crate) fn put_string_list(doc: &mut Document, field: &str, v: &[String]) {
    let items = v.iter().cloned().map(Value::String).collect();
    doc.insert(field.to_string(), Value::Array(items));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_meta_backfills_missing_pieces() {
        let mut doc = Document::new();
        let m = take_meta(&mut doc).unwrap();
        assert!(!m.id.is_empty());
        assert_eq!(m.created_at, m.updated_at);
    }

    #[test]
    fn take_meta_adopts_supplied_identity() {
        let mut doc = Document::new();
        doc.insert("id".into(), Value::String("abc-123".into()));
        doc.insert(
            "created_at".into(),
            Value::String("2024-01-02 03:04:05.000000".into()),
        );
        doc.insert(
            "updated_at".into(),
            Value::String("2024-01-02 03:04:06.000000".into()),
        );
        doc.insert(TYPE_KEY.into(), Value::String("State".into()));
        let m = take_meta(&mut doc).unwrap();
        assert_eq!(m.id, "abc-123");
        assert!(m.created_at < m.updated_at);
        // marker stripped, never left behind as an attribute
        assert!(doc.get(TYPE_KEY).is_none());
    }

    #[test]
    fn missing_updated_at_adopts_created_at() {
        let mut doc = Document::new();
        doc.insert(
            "created_at".into(),
            Value::String("2024-01-02 03:04:05.000000".into()),
        );
        let m = take_meta(&mut doc).unwrap();
        assert_eq!(m.created_at, m.updated_at);
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let mut doc = Document::new();
        doc.insert("id".into(), Value::Number(7.into()));
        assert!(matches!(
            take_meta(&mut doc),
            Err(ModelError::WrongShape { field: "id" })
        ));

        let mut doc = Document::new();
        doc.insert("name".into(), Value::Bool(true));
        assert!(take_string(&mut doc, "name").is_err());
    }

    #[test]
    fn non_finite_floats_fall_back_to_display_form() {
        let mut doc = Document::new();
        put_opt_f64(&mut doc, "latitude", &Some(f64::NAN));
        assert_eq!(doc.get("latitude").unwrap(), &Value::String("NaN".into()));
    }
}
