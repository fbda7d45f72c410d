//! Document storage.
//!
//! Every call is atomic at the document level; there is no cross-document
//! transaction and concurrent writes to the same field are last-write-wins.
//! Lookups, field sets and content replacement only see documents that are
//! not soft-deleted.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::model::{Collection, ContentDocument, ContentFields};
use crate::document::slug::Slug;
use crate::document::validate::ValidationError;
use crate::patch::types::SetOperation;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document '{slug}' already exists in {collection}")]
    Conflict { collection: Collection, slug: Slug },

    /// The write was refused after reading the current document.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Filters and paging for a collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub include_deleted: bool,
    /// Only documents with this publish status.
    pub status: Option<bool>,
}

impl ListQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub items: Vec<ContentDocument>,
    pub total: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up one live document.
    async fn find_one(
        &self,
        collection: Collection,
        slug: &Slug,
    ) -> Result<Option<ContentDocument>, StoreError>;

    /// Newest first.
    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<ListPage, StoreError>;

    /// Insert a new document. Slugs are unique per collection, soft-deleted
    /// documents included.
    async fn insert(
        &self,
        collection: Collection,
        document: ContentDocument,
    ) -> Result<ContentDocument, StoreError>;

    /// Apply a single-field set to a live document and return the result.
    /// `None` when no live document matches.
    async fn set_field(
        &self,
        collection: Collection,
        slug: &Slug,
        op: &SetOperation,
    ) -> Result<Option<ContentDocument>, StoreError>;

    /// Replace `data` (and `seo`/`status` when given) of a live document.
    async fn replace_content(
        &self,
        collection: Collection,
        slug: &Slug,
        fields: &ContentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<ContentDocument>, StoreError>;

    /// Physically remove a document, live or soft-deleted.
    async fn remove(&self, collection: Collection, slug: &Slug) -> Result<bool, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
