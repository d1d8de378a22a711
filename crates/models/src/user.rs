use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;

use crate::codec::{self, Audience, Document};
use crate::errors::ModelError;
use crate::meta::Meta;

/// Application account. The password is held as an argon2 hash; it appears
/// only in `Audience::Storage` documents and never in public ones.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub meta: Meta,
    pub email: String,
    password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    pub fn new(
        email: &str,
        password: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Self, ModelError> {
        if !email.contains('@') {
            return Err(ModelError::Validation("invalid email".into()));
        }
        let mut user = Self {
            meta: Meta::generate(),
            email: email.to_string(),
            password: String::new(),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
        };
        user.set_password(password)?;
        Ok(user)
    }

    /// Hash and store a new password. Plaintext is never retained.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), ModelError> {
        if plaintext.len() < 8 {
            return Err(ModelError::Validation("password too short (>=8)".into()));
        }
        let salt = SaltString::generate(&mut OsRng);
        self.password = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| ModelError::Hash(e.to_string()))?
            .to_string();
        Ok(())
    }

    /// Adopt an already-hashed password, e.g. when rebuilding from a
    /// persisted row or document.
    pub fn set_password_hash(&mut self, hash: String) {
        self.password = hash;
    }

    /// Rebuild from already-persisted parts; the reconstruction path used
    /// by storage backends.
    pub fn from_stored(
        meta: Meta,
        email: String,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self { meta, email, password: password_hash, first_name, last_name }
    }

    /// The stored hash; the storage layer reads this during writes.
    pub fn password_hash(&self) -> &str {
        &self.password
    }

    pub fn verify_password(&self, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    pub(crate) fn to_document(&self, audience: Audience) -> Document {
        let mut doc = Document::new();
        codec::write_meta(&mut doc, &self.meta);
        codec::put_string(&mut doc, "email", &self.email);
        if audience == Audience::Storage {
            codec::put_string(&mut doc, "password", &self.password);
        }
        codec::put_opt_string(&mut doc, "first_name", &self.first_name);
        codec::put_opt_string(&mut doc, "last_name", &self.last_name);
        doc
    }

    pub(crate) fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let meta = codec::take_meta(&mut doc)?;
        let email = codec::require_string(&mut doc, "email")?;
        // Absent when rebuilt from a public (redacted) document.
        let password = codec::take_string(&mut doc, "password")?.unwrap_or_default();
        let first_name = codec::take_string(&mut doc, "first_name")?;
        let last_name = codec::take_string(&mut doc, "last_name")?;
        Ok(Self { meta, email, password, first_name, last_name })
    }

    /// Bulk-update path. Identity and audit fields are protected; the
    /// password must go through `set_password` so a raw value can never
    /// land unhashed.
    pub(crate) fn apply_update(&mut self, fields: &Document) {
        for (key, value) in fields {
            match key.as_str() {
                "email" => {
                    if let Some(v) = value.as_str() {
                        if v.contains('@') {
                            self.email = v.to_string();
                        }
                    }
                }
                "first_name" => {
                    if let Some(v) = value.as_str() {
                        self.first_name = Some(v.to_string());
                    }
                }
                "last_name" => {
                    if let Some(v) = value.as_str() {
                        self.last_name = Some(v.to_string());
                    }
                }
                _ => {}
            }
        }
    }
}
