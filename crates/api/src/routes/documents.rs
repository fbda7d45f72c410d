use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use coop_cms_core::schema::FieldSchema;
use coop_cms_core::service::ListParams;
use coop_cms_core::{Collection, ContentDocument, ContentFields, NewDocument, PatchRequest, Slug};

use super::response::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Content routes, shared by every collection (`pages`, `navigation`, `footer`).
/// The home page slug is addressed as `_home`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/{collection}", get(list_documents).post(create_document))
        .route(
            "/api/{collection}/{slug}",
            get(get_document)
                .put(update_document)
                .patch(patch_document)
                .delete(delete_document),
        )
        .route("/api/{collection}/{slug}/schema", get(describe_document))
}

fn collection(raw: &str) -> ApiResult<Collection> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("unknown collection '{raw}'")))
}

fn target(raw_collection: &str, raw_slug: &str) -> ApiResult<(Collection, Slug)> {
    let collection = collection(raw_collection)?;
    let slug = Slug::from_route_param(raw_slug).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok((collection, slug))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(raw_collection): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<ContentDocument>>> {
    let collection = collection(&raw_collection)?;
    let Query(params) = params?;
    let listing = state.service().list(collection, &params).await?;
    Ok(Envelope::ok(listing.items).with_pagination(listing.pagination))
}

async fn create_document(
    State(state): State<AppState>,
    Path(raw_collection): Path<String>,
    body: Result<Json<NewDocument>, JsonRejection>,
) -> ApiResult<Envelope<ContentDocument>> {
    let collection = collection(&raw_collection)?;
    let Json(new) = body?;
    let created = state.service().create(collection, new).await?;
    Ok(Envelope::created(created).with_message("Document created"))
}

async fn get_document(
    State(state): State<AppState>,
    Path((raw_collection, raw_slug)): Path<(String, String)>,
) -> ApiResult<Envelope<ContentDocument>> {
    let (collection, slug) = target(&raw_collection, &raw_slug)?;
    let document = state.service().get(collection, &slug).await?;
    Ok(Envelope::ok(document))
}

async fn update_document(
    State(state): State<AppState>,
    Path((raw_collection, raw_slug)): Path<(String, String)>,
    body: Result<Json<ContentFields>, JsonRejection>,
) -> ApiResult<Envelope<ContentDocument>> {
    let (collection, slug) = target(&raw_collection, &raw_slug)?;
    let Json(fields) = body?;
    let updated = state.service().update(collection, &slug, fields).await?;
    Ok(Envelope::ok(updated).with_message("Document updated"))
}

/// `{ "path": "hero.title", "value": ... }`
async fn patch_document(
    State(state): State<AppState>,
    Path((raw_collection, raw_slug)): Path<(String, String)>,
    body: Result<Json<PatchRequest>, JsonRejection>,
) -> ApiResult<Envelope<ContentDocument>> {
    let (collection, slug) = target(&raw_collection, &raw_slug)?;
    let Json(request) = body?;
    let updated = state.service().patch(collection, &slug, request).await?;
    Ok(Envelope::ok(updated).with_message("Document patched"))
}

async fn delete_document(
    State(state): State<AppState>,
    Path((raw_collection, raw_slug)): Path<(String, String)>,
) -> ApiResult<Envelope<()>> {
    let (collection, slug) = target(&raw_collection, &raw_slug)?;
    state.service().delete(collection, &slug).await?;
    Ok(Envelope::ok(()).with_message("Document deleted"))
}

async fn describe_document(
    State(state): State<AppState>,
    Path((raw_collection, raw_slug)): Path<(String, String)>,
) -> ApiResult<Envelope<FieldSchema>> {
    let (collection, slug) = target(&raw_collection, &raw_slug)?;
    let schema = state.service().describe(collection, &slug).await?;
    Ok(Envelope::ok(schema))
}
