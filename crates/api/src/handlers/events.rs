//! Event bus handlers (C1, §6): recent events and a live SSE stream.

use crate::error::ApiError;
use crate::state::AppState;
use async_stream::stream;
use axum::{
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::Stream;
use integrity_core::{Event, EventBus, SubscriberId};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentEventsParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

pub fn events_routes() -> Router<AppState> {
    Router::new().route("/events", get(recent_events)).route("/events/stream", get(stream_events))
}

/// `GET /api/events?limit=N` (§6).
#[utoipa::path(
    get,
    path = "/api/events",
    params(RecentEventsParams),
    responses((status = 200, description = "Most recent events, newest first")),
    tag = "events"
)]
pub async fn recent_events(State(state): State<AppState>, Query(params): Query<RecentEventsParams>) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state.events.recent(params.limit).await?;
    Ok(Json(events))
}

/// Drops the live subscription when the SSE stream is cancelled, so a
/// disconnected client doesn't leak a subscriber slot in the bus.
struct SubscriptionGuard {
    events: Arc<dyn EventBus>,
    id: SubscriberId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.events.unsubscribe(self.id);
    }
}

/// `GET /api/events/stream` (§6): one JSON payload per SSE data frame.
#[utoipa::path(
    get,
    path = "/api/events/stream",
    responses((status = 200, description = "Live event stream (text/event-stream)")),
    tag = "events"
)]
pub async fn stream_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (id, mut receiver) = state.events.subscribe();
    let guard = SubscriptionGuard { events: state.events.clone(), id };

    let sse_stream = stream! {
        let _guard = guard;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(SseEvent::default().data(payload));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
