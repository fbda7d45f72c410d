//! Content operations over a [`DocumentStore`].
//!
//! Validation happens here, before the store is contacted. Store failures
//! are passed through, never retried.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::model::{Collection, ContentDocument, ContentFields, NewDocument};
use crate::document::slug::Slug;
use crate::document::validate::ValidationError;
use crate::events::bus::EventBus;
use crate::events::types::{ChangeEvent, ChangeKind, ContentEvent};
use crate::patch::path::{FieldAddress, RootField};
use crate::patch::types::{PatchRequest, SetOperation};
use crate::schema::FieldSchema;
use crate::store::{DocumentStore, ListQuery, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{collection} document '{slug}' not found")]
    NotFound { collection: Collection, slug: Slug },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(validation) => ServiceError::Validation(validation),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Stamp `deletedAt`; the document disappears from normal reads.
    Soft,
    /// Remove the document from the store.
    Hard,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soft" => Ok(DeletePolicy::Soft),
            "hard" => Ok(DeletePolicy::Hard),
            other => Err(format!("unknown delete policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub delete_policy: DeletePolicy,
    pub strict_patch_types: bool,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Soft,
            strict_patch_types: false,
            default_page_limit: 20,
            max_page_limit: 100,
        }
    }
}

/// Listing parameters as received from a caller; every member optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub include_deleted: Option<bool>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub items: Vec<ContentDocument>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn DocumentStore>,
    events: EventBus,
    settings: ServiceSettings,
}

impl ContentService {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus, settings: ServiceSettings) -> Self {
        Self {
            store,
            events,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn create(
        &self,
        collection: Collection,
        new: NewDocument,
    ) -> ServiceResult<ContentDocument> {
        new.validate()?;
        let now = Utc::now();
        let document = ContentDocument::create(new, now)?;
        let created = self.store.insert(collection, document).await?;

        tracing::info!(%collection, slug = %created.slug, "document created");
        self.notify(collection, &created.slug, ChangeKind::Created, None, now);
        Ok(created)
    }

    pub async fn get(&self, collection: Collection, slug: &Slug) -> ServiceResult<ContentDocument> {
        self.store
            .find_one(collection, slug)
            .await?
            .ok_or_else(|| not_found(collection, slug))
    }

    pub async fn list(&self, collection: Collection, params: &ListParams) -> ServiceResult<Listing> {
        let query = self.list_query(params);
        let page = self.store.list(collection, &query).await?;
        let pages = page.total.div_ceil(u64::from(query.limit));

        Ok(Listing {
            items: page.items,
            pagination: Pagination {
                page: query.page,
                limit: query.limit,
                total: page.total,
                pages,
            },
        })
    }

    /// Resolve caller-supplied listing parameters against the configured
    /// limits. Page numbers start at 1; the limit is clamped to
    /// `1..=max_page_limit`.
    pub fn list_query(&self, params: &ListParams) -> ListQuery {
        let limit = params
            .limit
            .unwrap_or(self.settings.default_page_limit)
            .clamp(1, self.settings.max_page_limit.max(1));
        ListQuery {
            page: params.page.unwrap_or(1).max(1),
            limit,
            include_deleted: params.include_deleted.unwrap_or(false),
            status: params.status,
        }
    }

    /// Replace `data`, and `seo`/`status` when supplied.
    pub async fn update(
        &self,
        collection: Collection,
        slug: &Slug,
        fields: ContentFields,
    ) -> ServiceResult<ContentDocument> {
        fields.validate()?;
        let now = Utc::now();
        let updated = self
            .store
            .replace_content(collection, slug, &fields, now)
            .await?
            .ok_or_else(|| not_found(collection, slug))?;

        tracing::info!(%collection, %slug, "document updated");
        self.notify(collection, slug, ChangeKind::Updated, None, now);
        Ok(updated)
    }

    /// Set exactly one field of one document, addressed by a dot/bracket path.
    ///
    /// Paths whose first segment names a reserved root field (`seo`, `status`,
    /// `deletedAt`, `slug`, `dateUpdated`, `dateCreated`) address the root;
    /// everything else is rooted under `data`. `dateUpdated` is always
    /// stamped with the current time.
    pub async fn patch(
        &self,
        collection: Collection,
        slug: &Slug,
        request: PatchRequest,
    ) -> ServiceResult<ContentDocument> {
        let address = request.address()?;
        let now = Utc::now();
        let op = SetOperation::new(address, request.value, now)
            .strict(self.settings.strict_patch_types);

        let updated = self
            .store
            .set_field(collection, slug, &op)
            .await?
            .ok_or_else(|| not_found(collection, slug))?;

        tracing::info!(%collection, %slug, address = %op.address, "document patched");
        self.notify(
            collection,
            &updated.slug,
            ChangeKind::Patched,
            Some(op.address.to_string()),
            now,
        );
        Ok(updated)
    }

    /// Delete according to the configured policy. Soft deletes go through the
    /// same single-field set as a patch of `deletedAt`.
    pub async fn delete(&self, collection: Collection, slug: &Slug) -> ServiceResult<()> {
        let now = Utc::now();
        match self.settings.delete_policy {
            DeletePolicy::Soft => {
                let op = SetOperation::new(
                    FieldAddress::root(RootField::DeletedAt),
                    Value::String(now.to_rfc3339()),
                    now,
                );
                self.store
                    .set_field(collection, slug, &op)
                    .await?
                    .ok_or_else(|| not_found(collection, slug))?;
            }
            DeletePolicy::Hard => {
                if !self.store.remove(collection, slug).await? {
                    return Err(not_found(collection, slug));
                }
            }
        }

        tracing::info!(%collection, %slug, policy = ?self.settings.delete_policy, "document deleted");
        self.notify(collection, slug, ChangeKind::Deleted, None, now);
        Ok(())
    }

    /// Editor schema of a document's content tree.
    pub async fn describe(&self, collection: Collection, slug: &Slug) -> ServiceResult<FieldSchema> {
        let document = self.get(collection, slug).await?;
        Ok(FieldSchema::infer_object(&document.data))
    }

    fn notify(
        &self,
        collection: Collection,
        slug: &Slug,
        kind: ChangeKind,
        address: Option<String>,
        timestamp: DateTime<Utc>,
    ) {
        let delivered = self.events.publish(ContentEvent::Change(ChangeEvent {
            collection,
            slug: slug.clone(),
            kind,
            address,
            timestamp,
        }));
        tracing::trace!(delivered, "change event published");
    }
}

fn not_found(collection: Collection, slug: &Slug) -> ServiceError {
    ServiceError::NotFound {
        collection,
        slug: slug.clone(),
    }
}
