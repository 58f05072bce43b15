//! Event stream adapter: turns a run's `StepEvent` receiver into an SSE
//! byte stream. No direct teacher grounding exists for SSE framing itself —
//! documented as a gap in the design ledger — so this is built from
//! `tokio-stream`, the crate the ecosystem reaches for alongside `tokio`
//! channels, rather than hand-rolling a `Stream` impl.

use std::convert::Infallible;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};

use crate::domain::StepEvent;

pub const SSE_CONTENT_TYPE: &str = "text/event-stream";
pub const SSE_CACHE_CONTROL: &str = "no-cache";
pub const SSE_CONNECTION: &str = "keep-alive";

fn step_frame(event: &StepEvent) -> Bytes {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Bytes::from(format!("event: step\ndata: {data}\n\n"))
}

fn done_frame() -> Bytes {
    Bytes::from_static(b"event: done\ndata: {}\n\n")
}

/// Converts a run's progress channel into framed SSE bytes, appending a
/// terminal `done` event once the channel closes (the orchestrator's
/// event guard drops its sender exactly once, when the run ends).
pub fn event_stream(rx: mpsc::Receiver<StepEvent>) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let events = tokio_stream::wrappers::ReceiverStream::new(rx).map(|event| Ok(step_frame(&event)));
    let done = tokio_stream::iter(std::iter::once(Ok(done_frame())));
    events.chain(done)
}
