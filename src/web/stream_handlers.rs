//! Server-Sent Events (SSE) streaming handlers for solution delivery
//!
//! Relays model output token-by-token to the browser so the suggested
//! solution renders incrementally as it is generated.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use log::{error, info};
use serde::Serialize;
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::shared::state::AppState;
use crate::tickets::error::TicketError;
use crate::tickets::service::SolutionStream;

/// SSE event types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum StreamEvent {
    /// Stream started
    Start { ticket_id: String, model: String },
    /// Token chunk
    Token { content: String },
    /// Generation failed
    Error { message: String },
    /// Stream completed
    Done,
}

impl StreamEvent {
    pub fn to_sse_event(&self) -> Result<Event, serde_json::Error> {
        let event_type = match self {
            StreamEvent::Start { .. } => "start",
            StreamEvent::Token { .. } => "token",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Done => "done",
        };

        let data = serde_json::to_string(self)?;
        Ok(Event::default().event(event_type).data(data))
    }
}

/// Stream the generated solution for a ticket over SSE.
///
/// The ticket lookup happens before the stream opens: a missing ticket is a
/// plain 404, not an SSE error event.
pub async fn stream_solution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, TicketError> {
    let solution = state.tickets.generate_solution(&id).await?;
    let model = state.config.llm.model.clone();

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(100);

    tokio::spawn(async move {
        forward_solution(solution, tx, id, model).await;
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Forward generator output as SSE events until the token channel closes,
/// then surface any provider failure before the terminal `done` event.
async fn forward_solution(
    mut solution: SolutionStream,
    tx: mpsc::Sender<Result<Event, Infallible>>,
    ticket_id: String,
    model: String,
) {
    let start_event = StreamEvent::Start { ticket_id, model };
    if let Ok(event) = start_event.to_sse_event() {
        if tx.send(Ok(event)).await.is_err() {
            return;
        }
    }

    while let Some(token) = solution.tokens.recv().await {
        let token_event = StreamEvent::Token { content: token };
        if let Ok(event) = token_event.to_sse_event() {
            if tx.send(Ok(event)).await.is_err() {
                // Client disconnected
                info!("Client disconnected from solution stream");
                return;
            }
        }
    }

    if let Err(e) = solution.finish().await {
        error!("Solution generation failed: {}", e);
        let error_event = StreamEvent::Error {
            message: e.to_string(),
        };
        if let Ok(event) = error_event.to_sse_event() {
            let _ = tx.send(Ok(event)).await;
        }
    }

    if let Ok(event) = StreamEvent::Done.to_sse_event() {
        let _ = tx.send(Ok(event)).await;
    }
}

/// Create routes for streaming endpoints
pub fn routes() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;

    axum::Router::new().route("/api/tickets/:id/solution", get(stream_solution))
}
