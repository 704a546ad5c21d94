//! Server-Sent Events for the live candidate feed.
//!
//! Each client gets the current candidate list on connect and the full list
//! again after every directory change. A comment line keeps idle
//! connections open.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use election_core::CandidateEvent;
use futures::stream::{self, Stream};
use tokio_stream::StreamExt;
use tracing::debug;

use crate::middleware::AppState;

fn to_event(event: &CandidateEvent) -> Event {
    Event::default()
        .json_data(event)
        .unwrap_or_else(|_| Event::default().data("error"))
}

/// Candidate feed SSE stream.
pub async fn candidate_feed(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before reading the snapshot so no change falls in between.
    let subscription = state.notifier().subscribe().await;
    let snapshot = state.candidate_service.list().await;
    debug!(subscriber = subscription.id(), "Candidate feed connected");

    let initial = stream::once(async move {
        Ok(to_event(&CandidateEvent::CandidatesUpdated { data: snapshot }))
    });
    let updates = subscription.map(|event| Ok(to_event(&event)));

    Sse::new(initial.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(state.keep_alive())
            .text("ping"),
    )
}
