//! # Collection Index
//!
//! The in-memory tree of folders (collections) and the files (documents) they own,
//! plus its serialized form.
//!
//! ## Lookup
//!
//! Collections and documents are held in maps keyed by id, with separate `Vec`s for
//! display order. Every lookup by id is O(1), and an unknown id is an explicit
//! [`MathNotesError::CollectionNotFound`] / [`MathNotesError::DocumentNotFound`] rather
//! than a silent no-op.
//!
//! ## Serialized Form
//!
//! [`CollectionIndex::serialize`] writes metadata only: collection ids and names,
//! document ids, names and storage keys, and ordering. Page bytes never go into the
//! index; they live in the page store.
//!
//! ```json
//! {
//!   "version": 1,
//!   "collections": [
//!     {
//!       "id": "…", "name": "Math", "created_at": "…",
//!       "documents": [
//!         { "id": "…", "name": "Limits", "storage_key": "….drawing",
//!           "created_at": "…", "updated_at": "…" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! ## Decode Fallback
//!
//! [`CollectionIndex::deserialize`] never fails. First-run (no bytes) and malformed
//! bytes both produce the default tree of empty named collections. A fallback over real
//! data loses that data; it is logged, not surfaced.
//!
//! Pages are loaded in a separate pass by the owner of the index. The index itself
//! never touches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{error, info};
use uuid::Uuid;

use crate::document::Document;
use crate::error::{MathNotesError, Result};
use crate::model::{CollectionMeta, DocumentMeta, PagePayload, StorageKey};

const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionEntry {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    documents: Vec<DocumentMeta>,
}

#[derive(Debug, Clone)]
pub struct CollectionIndex<P: PagePayload> {
    order: Vec<Uuid>,
    collections: HashMap<Uuid, CollectionMeta>,
    documents: HashMap<Uuid, Document<P>>,
    owners: HashMap<Uuid, Uuid>,
}

impl<P: PagePayload> Default for CollectionIndex<P> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            collections: HashMap::new(),
            documents: HashMap::new(),
            owners: HashMap::new(),
        }
    }
}

impl<P: PagePayload> CollectionIndex<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tree a fresh install starts with: one empty collection per name.
    pub fn with_defaults<S: AsRef<str>>(names: &[S]) -> Self {
        let mut index = Self::new();
        for name in names {
            index.add_collection(name.as_ref().to_string());
        }
        index
    }

    pub fn add_collection(&mut self, name: String) -> Uuid {
        let collection = CollectionMeta::new(name);
        let id = collection.id;
        self.order.push(id);
        self.collections.insert(id, collection);
        id
    }

    pub fn add_document(&mut self, collection_id: Uuid, name: String) -> Result<Uuid> {
        let collection = self
            .collections
            .get_mut(&collection_id)
            .ok_or(MathNotesError::CollectionNotFound(collection_id))?;

        let document = Document::new(name);
        let id = document.id();
        collection.documents.push(id);
        self.owners.insert(id, collection_id);
        self.documents.insert(id, document);
        Ok(id)
    }

    pub fn rename_collection(&mut self, id: Uuid, name: String) -> Result<()> {
        let collection = self
            .collections
            .get_mut(&id)
            .ok_or(MathNotesError::CollectionNotFound(id))?;
        collection.name = name;
        Ok(())
    }

    pub fn rename_document(&mut self, id: Uuid, name: String) -> Result<()> {
        self.document_mut(id)?.rename(name);
        Ok(())
    }

    pub fn collection(&self, id: Uuid) -> Result<&CollectionMeta> {
        self.collections
            .get(&id)
            .ok_or(MathNotesError::CollectionNotFound(id))
    }

    pub fn document(&self, id: Uuid) -> Result<&Document<P>> {
        self.documents
            .get(&id)
            .ok_or(MathNotesError::DocumentNotFound(id))
    }

    pub fn document_mut(&mut self, id: Uuid) -> Result<&mut Document<P>> {
        self.documents
            .get_mut(&id)
            .ok_or(MathNotesError::DocumentNotFound(id))
    }

    /// Collection that owns the given document.
    pub fn owner_of(&self, document_id: Uuid) -> Result<&CollectionMeta> {
        let owner = self
            .owners
            .get(&document_id)
            .ok_or(MathNotesError::DocumentNotFound(document_id))?;
        self.collection(*owner)
    }

    /// Collections in display order.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionMeta> {
        self.order.iter().filter_map(|id| self.collections.get(id))
    }

    /// Documents of one collection, in display order.
    pub fn documents_in(&self, collection_id: Uuid) -> Result<Vec<&Document<P>>> {
        let collection = self.collection(collection_id)?;
        Ok(collection
            .documents
            .iter()
            .filter_map(|id| self.documents.get(id))
            .collect())
    }

    /// Every document in the tree, collection by collection.
    pub fn all_documents(&self) -> impl Iterator<Item = &Document<P>> {
        self.collections()
            .flat_map(|c| c.documents.iter())
            .filter_map(|id| self.documents.get(id))
    }

    pub fn document_ids(&self) -> Vec<Uuid> {
        self.all_documents().map(|d| d.id()).collect()
    }

    pub fn collection_count(&self) -> usize {
        self.order.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Resolve a collection by uuid or exact name (first match in display order).
    pub fn find_collection(&self, selector: &str) -> Option<&CollectionMeta> {
        if let Ok(id) = Uuid::parse_str(selector) {
            if let Some(collection) = self.collections.get(&id) {
                return Some(collection);
            }
        }
        self.collections().find(|c| c.name == selector)
    }

    /// Resolve a document by uuid or `Collection/Document` path.
    pub fn find_document(&self, selector: &str) -> Option<&Document<P>> {
        if let Ok(id) = Uuid::parse_str(selector) {
            if let Some(document) = self.documents.get(&id) {
                return Some(document);
            }
        }
        let (collection_name, document_name) = selector.split_once('/')?;
        let collection = self.find_collection(collection_name)?;
        collection
            .documents
            .iter()
            .filter_map(|id| self.documents.get(id))
            .find(|d| d.name() == document_name)
    }

    /// Replace a document in place, keeping its position. Used by the page-load pass.
    pub fn replace_document(&mut self, document: Document<P>) -> Result<()> {
        let slot = self
            .documents
            .get_mut(&document.id())
            .ok_or(MathNotesError::DocumentNotFound(document.id()))?;
        *slot = document;
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            collections: self
                .collections()
                .map(|c| CollectionEntry {
                    id: c.id,
                    name: c.name.clone(),
                    created_at: c.created_at,
                    documents: c
                        .documents
                        .iter()
                        .filter_map(|id| self.documents.get(id))
                        .map(|d| d.meta().clone())
                        .collect(),
                })
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(MathNotesError::Serialization)?;
        Ok(bytes)
    }

    /// Decode a serialized tree, falling back to `default_names` on any failure.
    ///
    /// Every document comes back with a single blank page; pages are loaded later.
    pub fn deserialize<S: AsRef<str>>(bytes: Option<&[u8]>, default_names: &[S]) -> Self {
        let Some(bytes) = bytes else {
            info!("no index found, starting with default collections");
            return Self::with_defaults(default_names);
        };

        match Self::decode(bytes) {
            Ok(index) => index,
            Err(e) => {
                error!(error = %e, "index unreadable, falling back to default collections");
                Self::with_defaults(default_names)
            }
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let file: IndexFile = serde_json::from_slice(bytes).map_err(MathNotesError::Serialization)?;
        if file.version != INDEX_FORMAT_VERSION {
            return Err(MathNotesError::Corrupt(format!(
                "unsupported index version {}",
                file.version
            )));
        }

        let mut index = Self::new();
        let mut keys: HashSet<StorageKey> = HashSet::new();
        for entry in file.collections {
            if index.collections.contains_key(&entry.id) {
                return Err(MathNotesError::Corrupt(format!(
                    "duplicate collection id {}",
                    entry.id
                )));
            }

            let mut collection = CollectionMeta {
                id: entry.id,
                name: entry.name,
                created_at: entry.created_at,
                documents: Vec::with_capacity(entry.documents.len()),
            };
            for meta in entry.documents {
                let id = meta.id;
                if index.documents.contains_key(&id) {
                    return Err(MathNotesError::Corrupt(format!(
                        "duplicate document id {}",
                        id
                    )));
                }
                // Two documents sharing a key would overwrite each other's pages
                if !keys.insert(meta.storage_key.clone()) {
                    return Err(MathNotesError::Corrupt(format!(
                        "duplicate storage key {}",
                        meta.storage_key
                    )));
                }
                collection.documents.push(id);
                index.owners.insert(id, entry.id);
                index.documents.insert(id, Document::from_meta(meta));
            }

            index.order.push(entry.id);
            index.collections.insert(entry.id, collection);
        }
        Ok(index)
    }
}

/// Metadata-only view used to compare trees irrespective of page content.
#[derive(Debug, PartialEq, Eq)]
pub struct TreeShape {
    pub collections: Vec<(CollectionMeta, Vec<DocumentMeta>)>,
}

impl<P: PagePayload> CollectionIndex<P> {
    pub fn shape(&self) -> TreeShape {
        TreeShape {
            collections: self
                .collections()
                .map(|c| {
                    let docs = c
                        .documents
                        .iter()
                        .filter_map(|id| self.documents.get(id))
                        .map(|d| d.meta().clone())
                        .collect();
                    (c.clone(), docs)
                })
                .collect(),
        }
    }
}
