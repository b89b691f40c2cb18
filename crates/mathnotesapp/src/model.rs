//! # Domain Model: Identity, Storage Keys and Page Payloads
//!
//! This module defines the small set of types every other layer agrees on:
//! [`StorageKey`], [`DocumentMeta`], [`CollectionMeta`] and the [`PagePayload`] trait.
//!
//! ## Identity vs. Storage Naming
//!
//! A document has two names that must never be confused:
//!
//! - `id`: the stable identity used by the in-memory tree and the index.
//! - `storage_key`: the prefix its page blobs live under on disk.
//!
//! The storage key is derived from the id exactly once, when the document is created,
//! and from then on it is *data*: it travels through the serialized index and is read
//! back verbatim. It is never recomputed from the id on load. If the derivation scheme
//! ever changes, documents created under the old scheme keep their old key and their
//! pages stay reachable.
//!
//! ## Page Payloads
//!
//! Pages are opaque to the persistence layer. The only things it needs from the
//! drawing surface are:
//!
//! - a blank page (`Default`)
//! - "is this page blank?" ([`PagePayload::is_blank`])
//! - bytes in, bytes out ([`PagePayload::to_bytes`], [`PagePayload::from_bytes`])
//!
//! See [`crate::drawing`] for the payloads shipped with the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

const STORAGE_KEY_SUFFIX: &str = ".drawing";

/// Prefix under which a document's page blobs are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for a freshly created document.
    ///
    /// Only called at creation time. Loaded documents use the persisted key.
    pub fn for_new_document(id: &Uuid) -> Self {
        Self(format!("{}{}", id, STORAGE_KEY_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StorageKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything about a document except its pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: Uuid,
    pub name: String,
    pub storage_key: StorageKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentMeta {
    pub fn new(name: String) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            name,
            storage_key: StorageKey::for_new_document(&id),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A folder: a name plus the ordered ids of the documents it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMeta {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub documents: Vec<Uuid>,
}

impl CollectionMeta {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
            documents: Vec::new(),
        }
    }
}

/// One page of hand-drawn content, as produced by the drawing surface.
pub trait PagePayload: Clone + Default + fmt::Debug {
    /// True when the page carries no visible strokes.
    fn is_blank(&self) -> bool;

    fn to_bytes(&self) -> Vec<u8>;

    /// Must return [`crate::error::MathNotesError::Corrupt`] for bytes that do not decode.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_derived_from_id() {
        let id = Uuid::new_v4();
        let key = StorageKey::for_new_document(&id);
        assert_eq!(key.as_str(), format!("{}.drawing", id));
    }

    #[test]
    fn test_new_document_meta_uses_its_own_id_for_key() {
        let meta = DocumentMeta::new("Integrals".to_string());
        assert_eq!(meta.storage_key, StorageKey::for_new_document(&meta.id));
        assert_eq!(meta.created_at, meta.updated_at);
    }

    #[test]
    fn test_storage_key_serializes_as_plain_string() {
        let key = StorageKey::from("legacy-key".to_string());
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"legacy-key\"");
    }
}
