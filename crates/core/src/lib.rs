//! Content model, path patching and storage for the cooperative website backend.

pub mod document;
pub mod events;
pub mod patch;
pub mod schema;
pub mod service;
pub mod store;

pub use document::model::{Collection, ContentDocument, ContentFields, NewDocument};
pub use document::slug::Slug;
pub use document::validate::ValidationError;
pub use patch::path::{FieldAddress, PathSegment, RootField};
pub use patch::types::{PatchRequest, SetOperation};
pub use service::{ContentService, DeletePolicy, ServiceError, ServiceSettings};
pub use store::{DocumentStore, ListQuery, StoreError};
