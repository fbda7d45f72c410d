use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::model::Collection;
use crate::document::slug::Slug;

/// Events emitted after successful writes, consumed by SSE listeners so the
/// public site can refresh cached content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    Welcome,
    Change(ChangeEvent),
    /// Sent to a listener that fell behind and missed events.
    Reconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Created,
    Updated,
    Patched,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub slug: Slug,
    pub kind: ChangeKind,
    /// Resolved field address for patches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ContentEvent {
    /// Name used for the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            ContentEvent::Welcome => "welcome",
            ContentEvent::Change(_) => "change",
            ContentEvent::Reconnect => "reconnect",
        }
    }
}
