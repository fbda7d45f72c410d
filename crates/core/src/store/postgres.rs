use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use super::{DocumentStore, ListPage, ListQuery, StoreError};
use crate::document::model::{Collection, ContentDocument, ContentFields, DocumentRow};
use crate::document::slug::Slug;
use crate::patch::types::SetOperation;

const COLUMNS: &str =
    "id, collection, slug, data, seo, status, deleted_at, date_created, date_updated";

/// Store backed by the `documents` PostgreSQL table.
///
/// Field sets read the row `FOR UPDATE`, apply the set in process and write
/// the row back inside one transaction, so a patch is atomic per document.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_live(
        tx: &mut Transaction<'_, Postgres>,
        collection: Collection,
        slug: &Slug,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM documents \
             WHERE collection = $1 AND slug = $2 AND deleted_at IS NULL \
             FOR UPDATE"
        ))
        .bind(collection.as_str())
        .bind(slug.as_str())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(ContentDocument::try_from).transpose()?)
    }

    async fn write_back(
        tx: &mut Transaction<'_, Postgres>,
        collection: Collection,
        doc: &ContentDocument,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE documents SET slug = $2, data = $3, seo = $4, status = $5, \
             deleted_at = $6, date_created = $7, date_updated = $8 \
             WHERE id = $1",
        )
        .bind(doc.id)
        .bind(doc.slug.as_str())
        .bind(Value::Object(doc.data.clone()))
        .bind(Value::Object(doc.seo.clone()))
        .bind(doc.status)
        .bind(doc.deleted_at)
        .bind(doc.date_created)
        .bind(doc.date_updated)
        .execute(&mut **tx)
        .await
        .map_err(|e| conflict_or(e, collection, &doc.slug))?;
        Ok(())
    }
}

/// Map a unique-constraint violation on `(collection, slug)` to a conflict.
fn conflict_or(err: sqlx::Error, collection: Collection, slug: &Slug) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
            collection,
            slug: slug.clone(),
        },
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        slug: &Slug,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM documents \
             WHERE collection = $1 AND slug = $2 AND deleted_at IS NULL"
        ))
        .bind(collection.as_str())
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ContentDocument::try_from).transpose()?)
    }

    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<ListPage, StoreError> {
        const FILTER: &str = "collection = $1 \
             AND ($2 OR deleted_at IS NULL) \
             AND ($3::boolean IS NULL OR status = $3)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM documents WHERE {FILTER}"))
            .bind(collection.as_str())
            .bind(query.include_deleted)
            .bind(query.status)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE {FILTER} \
             ORDER BY date_created DESC, slug ASC LIMIT $4 OFFSET $5"
        ))
        .bind(collection.as_str())
        .bind(query.include_deleted)
        .bind(query.status)
        .bind(i64::from(query.limit))
        .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(ContentDocument::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn insert(
        &self,
        collection: Collection,
        document: ContentDocument,
    ) -> Result<ContentDocument, StoreError> {
        sqlx::query(&format!(
            "INSERT INTO documents ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(document.id)
        .bind(collection.as_str())
        .bind(document.slug.as_str())
        .bind(Value::Object(document.data.clone()))
        .bind(Value::Object(document.seo.clone()))
        .bind(document.status)
        .bind(document.deleted_at)
        .bind(document.date_created)
        .bind(document.date_updated)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, collection, &document.slug))?;

        Ok(document)
    }

    async fn set_field(
        &self,
        collection: Collection,
        slug: &Slug,
        op: &SetOperation,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = Self::lock_live(&mut tx, collection, slug).await? else {
            return Ok(None);
        };

        let updated = current.apply_set(op)?;
        Self::write_back(&mut tx, collection, &updated).await?;
        tx.commit().await?;

        tracing::debug!(%collection, %slug, address = %op.address, "field set committed");
        Ok(Some(updated))
    }

    async fn replace_content(
        &self,
        collection: Collection,
        slug: &Slug,
        fields: &ContentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<ContentDocument>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = Self::lock_live(&mut tx, collection, slug).await? else {
            return Ok(None);
        };

        let updated = current.replace_content(fields, now)?;
        Self::write_back(&mut tx, collection, &updated).await?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn remove(&self, collection: Collection, slug: &Slug) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND slug = $2")
            .bind(collection.as_str())
            .bind(slug.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
