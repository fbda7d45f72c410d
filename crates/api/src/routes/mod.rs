pub mod documents;
pub mod events;
pub mod health;
pub mod response;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(events::routes())
        .merge(documents::routes())
        .with_state(state)
}
