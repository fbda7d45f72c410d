use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{DocumentStore, ListPage, ListQuery, StoreError};
use crate::document::model::{Collection, ContentDocument, ContentFields};
use crate::document::slug::Slug;
use crate::patch::types::SetOperation;

type Key = (Collection, Slug);

/// In-process store backed by a `HashMap` behind a `tokio::RwLock`.
/// Used for tests and for running the API without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<Key, ContentDocument>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all collections, deleted included.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        slug: &Slug,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(collection, slug.clone()))
            .filter(|doc| !doc.is_deleted())
            .cloned())
    }

    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<ListPage, StoreError> {
        let documents = self.documents.read().await;
        let mut matching: Vec<&ContentDocument> = documents
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, doc)| doc)
            .filter(|doc| query.include_deleted || !doc.is_deleted())
            .filter(|doc| query.status.map_or(true, |status| doc.status == status))
            .collect();

        matching.sort_by(|a, b| {
            b.date_created
                .cmp(&a.date_created)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ListPage { items, total })
    }

    async fn insert(
        &self,
        collection: Collection,
        document: ContentDocument,
    ) -> Result<ContentDocument, StoreError> {
        let mut documents = self.documents.write().await;
        let key = (collection, document.slug.clone());
        if documents.contains_key(&key) {
            return Err(StoreError::Conflict {
                collection,
                slug: document.slug,
            });
        }
        documents.insert(key, document.clone());
        Ok(document)
    }

    async fn set_field(
        &self,
        collection: Collection,
        slug: &Slug,
        op: &SetOperation,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let mut documents = self.documents.write().await;
        let key = (collection, slug.clone());
        let Some(current) = documents.get(&key).filter(|doc| !doc.is_deleted()) else {
            return Ok(None);
        };

        let updated = current.apply_set(op)?;
        if updated.slug != *slug {
            let new_key = (collection, updated.slug.clone());
            if documents.contains_key(&new_key) {
                return Err(StoreError::Conflict {
                    collection,
                    slug: updated.slug,
                });
            }
            documents.remove(&key);
            documents.insert(new_key, updated.clone());
        } else {
            documents.insert(key, updated.clone());
        }
        Ok(Some(updated))
    }

    async fn replace_content(
        &self,
        collection: Collection,
        slug: &Slug,
        fields: &ContentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(current) = documents
            .get_mut(&(collection, slug.clone()))
            .filter(|doc| !doc.is_deleted())
        else {
            return Ok(None);
        };
        *current = current.replace_content(fields, now)?;
        Ok(Some(current.clone()))
    }

    async fn remove(&self, collection: Collection, slug: &Slug) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(&(collection, slug.clone())).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
