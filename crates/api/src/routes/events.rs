use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use coop_cms_core::events::types::ContentEvent;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::state::AppState;

/// Change notification routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/events", get(listen))
}

/// Server-sent events stream of content changes. Starts with a `welcome`
/// event; a listener that lags behind receives `reconnect` and should
/// refetch what it caches.
async fn listen(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.event_bus().subscribe();
    tracing::debug!(
        subscribers = state.event_bus().subscriber_count(),
        "event listener connected"
    );

    let welcome = stream::once(async { Ok::<_, Infallible>(to_sse(&ContentEvent::Welcome)) });
    let changes = stream::unfold(receiver, |mut receiver| async move {
        let event = next_event(&mut receiver).await?;
        Some((Ok::<_, Infallible>(to_sse(&event)), receiver))
    });

    Sse::new(welcome.chain(changes))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn next_event(receiver: &mut broadcast::Receiver<ContentEvent>) -> Option<ContentEvent> {
    match receiver.recv().await {
        Ok(event) => Some(event),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "event listener lagged");
            Some(ContentEvent::Reconnect)
        }
        Err(RecvError::Closed) => None,
    }
}

fn to_sse(event: &ContentEvent) -> Event {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => sse,
        Err(e) => {
            tracing::error!("failed to encode event: {e}");
            Event::default().event(ContentEvent::Reconnect.name())
        }
    }
}
