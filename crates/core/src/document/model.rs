use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::slug::Slug;
use super::validate::{validate_data, validate_seo, ValidationError};

/// Named document collections served by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Pages keyed by page slug.
    Pages,
    /// Navigation bar content keyed by language code.
    Navigation,
    /// Footer content keyed by language code.
    Footer,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Pages, Collection::Navigation, Collection::Footer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Pages => "pages",
            Collection::Navigation => "navigation",
            Collection::Footer => "footer",
        }
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown collection '{s}'"))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content document as stored and returned to clients.
///
/// `data` holds the arbitrary content tree; every other member is a reserved
/// root field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    pub id: Uuid,
    pub slug: Slug,
    pub data: Map<String, Value>,
    #[serde(default)]
    pub seo: Map<String, Value>,
    pub status: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl ContentDocument {
    /// Build a fresh document from a create request.
    pub fn create(new: NewDocument, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let NewDocument {
            slug,
            data,
            seo,
            status,
        } = new;
        Ok(Self {
            id: Uuid::now_v7(),
            slug,
            data: into_object(data, ValidationError::DataNotObject)?,
            seo: match seo {
                Some(seo) => into_object(seo, ValidationError::SeoNotObject)?,
                None => Map::new(),
            },
            status: status.unwrap_or(true),
            deleted_at: None,
            date_created: now,
            date_updated: now,
        })
    }

    /// Replace the content fields wholesale, keeping identity and creation time.
    pub fn replace_content(
        &self,
        fields: &ContentFields,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        fields.validate()?;
        let mut next = self.clone();
        next.data = into_object(fields.data.clone(), ValidationError::DataNotObject)?;
        if let Some(seo) = &fields.seo {
            next.seo = into_object(seo.clone(), ValidationError::SeoNotObject)?;
        }
        if let Some(status) = fields.status {
            next.status = status;
        }
        next.date_updated = now;
        Ok(next)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

fn into_object(value: Value, err: ValidationError) -> Result<Map<String, Value>, ValidationError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(err),
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(default = "Slug::home")]
    pub slug: Slug,
    pub data: Value,
    #[serde(default)]
    pub seo: Option<Value>,
    #[serde(default)]
    pub status: Option<bool>,
}

impl NewDocument {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_data(&self.data)?;
        validate_seo(self.seo.as_ref())
    }
}

/// Body of a full update: replaces `data`, and `seo`/`status` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFields {
    pub data: Value,
    #[serde(default)]
    pub seo: Option<Value>,
    #[serde(default)]
    pub status: Option<bool>,
}

impl ContentFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_data(&self.data)?;
        validate_seo(self.seo.as_ref())
    }
}

/// Database row representation of a document.
/// Maps to the `documents` PostgreSQL table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub collection: String,
    pub slug: String,
    pub data: Value,
    pub seo: Value,
    pub status: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for ContentDocument {
    type Error = ValidationError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            slug: Slug::parse(&row.slug)?,
            data: into_object(row.data, ValidationError::DataNotObject)?,
            seo: into_object(row.seo, ValidationError::SeoNotObject)?,
            status: row.status,
            deleted_at: row.deleted_at,
            date_created: row.date_created,
            date_updated: row.date_updated,
        })
    }
}
