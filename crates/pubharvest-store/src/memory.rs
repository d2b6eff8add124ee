//! JSON-file-backed document store.
//!
//! The whole document set lives in memory and serialises to a single
//! JSON file: loaded at open, written back on flush. Suitable for the
//! batch pipelines, which run one at a time; the revision token on
//! every save is still enforced so a concurrent editor loses cleanly
//! rather than silently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::document::StoredPublication;
use crate::error::{Result, StoreError};
use crate::index::{map_document, IndexName};
use crate::store::{DocumentStore, IndexKey};

pub struct JsonStore {
    docs: RwLock<HashMap<Uuid, StoredPublication>>,
    path: Option<PathBuf>,
}

impl JsonStore {
    /// An empty store with no backing file. Used in tests and as a
    /// scratch target.
    pub fn in_memory() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// Open a store backed by the given JSON file. A missing file
    /// yields an empty store; a present but unreadable one is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let docs = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let list: Vec<StoredPublication> = serde_json::from_str(&content)?;
            debug!(n = list.len(), path = %path.display(), "Store loaded");
            list.into_iter().map(|d| (d.id, d)).collect()
        } else {
            debug!(path = %path.display(), "Store file absent, starting empty");
            HashMap::new()
        };
        Ok(Self {
            docs: RwLock::new(docs),
            path: Some(path),
        })
    }

    /// Write the document set back to the backing file, if any.
    pub async fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let docs = self.docs.read().await;
        let mut list: Vec<&StoredPublication> = docs.values().collect();
        list.sort_by_key(|d| d.id);
        let content = serde_json::to_string_pretty(&list)?;
        std::fs::write(path, content)?;
        debug!(n = list.len(), path = %path.display(), "Store flushed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    fn new_rev() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[async_trait::async_trait]
impl DocumentStore for JsonStore {
    async fn get(&self, id: Uuid) -> Result<StoredPublication> {
        self.docs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save(
        &self,
        mut doc: StoredPublication,
        expected_rev: Option<&str>,
    ) -> Result<StoredPublication> {
        let mut docs = self.docs.write().await;
        let now = Utc::now();
        match expected_rev {
            None => {
                if doc.id.is_nil() {
                    doc.id = Uuid::new_v4();
                } else if docs.contains_key(&doc.id) {
                    return Err(StoreError::Conflict(doc.id.to_string()));
                }
                doc.created_at = now;
            }
            Some(rev) => {
                let stored = docs
                    .get(&doc.id)
                    .ok_or_else(|| StoreError::NotFound(doc.id.to_string()))?;
                if stored.rev != rev {
                    return Err(StoreError::Conflict(doc.id.to_string()));
                }
                doc.created_at = stored.created_at;
            }
        }
        doc.modified_at = now;
        doc.rev = Self::new_rev();
        docs.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn query_by_index(
        &self,
        index: IndexName,
        key: &IndexKey,
    ) -> Result<Vec<StoredPublication>> {
        let docs = self.docs.read().await;
        let mut hits: Vec<StoredPublication> = docs
            .values()
            .filter(|doc| {
                map_document(index, doc)
                    .iter()
                    .any(|emitted| key.matches(emitted))
            })
            .cloned()
            .collect();
        hits.sort_by_key(|d| d.id);
        Ok(hits)
    }
}
