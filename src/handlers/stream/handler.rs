//! Streaming WebSocket handler
//!
//! Bridges the wire-level connection to the transcription pipeline. Each
//! inbound binary frame is one chunk: it gets the next sequence number and
//! its provider call runs as an independent task under the admission
//! limiter. Completions funnel back through a channel into the reorder
//! buffer, and everything the buffer releases is written out in submission
//! order. Closing the connection aborts every in-flight call and discards
//! whatever the buffer still holds.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::core::relay::{Chunk, ChunkSequencer, TranscriptResult, TranscriptionClient};
use crate::errors::api_error::ApiError;
use crate::middleware::connection_limit::ClientIp;
use crate::state::AppState;

use super::messages::{StreamRoute, TranscriptFrame};

/// Channel buffer size for the per-connection pipelines
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How often the idle check runs
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Query parameters for the streaming endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Session identifier minted by the bootstrap endpoint. Required: a
    /// connection that cannot name a live session is rejected before upgrade.
    pub session: Option<String>,
}

/// Streaming WebSocket handler
///
/// Validates the session binding before upgrading: the identifier must name
/// a session that exists, is not closed, and has no other live connection.
/// The connection-limit middleware has already reserved a slot by the time
/// this runs; every rejection path here must release it.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<StreamParams>,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let client_ip = client_ip.map(|Extension(ClientIp(ip))| ip);

    let session_id = match params.session {
        Some(id) if !id.is_empty() => id,
        _ => {
            release_slot(&state, client_ip);
            return (StatusCode::BAD_REQUEST, "missing session identifier").into_response();
        }
    };

    if let Err(e) = state.sessions.attach(&session_id) {
        warn!(error = %e, "rejecting stream connection: session attach failed");
        release_slot(&state, client_ip);
        return ApiError::from(e).into_response();
    }

    info!(session_id = %session_id, "stream connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_stream_socket(socket, state, session_id, client_ip))
}

fn release_slot(state: &AppState, client_ip: Option<IpAddr>) {
    if let Some(ip) = client_ip {
        state.release_connection(ip);
    }
}

/// Drive one streaming connection until it closes.
async fn handle_stream_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    session_id: String,
    client_ip: Option<IpAddr>,
) {
    let connection_id = uuid::Uuid::new_v4();
    info!(session_id = %session_id, %connection_id, "stream connection established");

    let (sender, receiver) = socket.split();
    let (frame_tx, frame_rx) = mpsc::channel::<StreamRoute>(CHANNEL_BUFFER_SIZE);
    let sender_task = tokio::spawn(run_sender(sender, frame_rx));

    let limits = state.config.relay.clone();
    let client = Arc::new(TranscriptionClient::new(
        state.transcriber.clone(),
        limits.clone(),
        state.global_permits.clone(),
    ));

    run_pipeline(
        receiver,
        &frame_tx,
        client,
        ChunkSequencer::new(limits.reorder_window),
        limits.high_water(),
        state.config.stream_idle_timeout,
        &session_id,
    )
    .await;

    // Best-effort close frame, then cut the sender loose
    let _ = frame_tx.send(StreamRoute::Close).await;
    drop(frame_tx);
    let abort_handle = sender_task.abort_handle();
    if tokio::time::timeout(Duration::from_secs(1), sender_task)
        .await
        .is_err()
    {
        abort_handle.abort();
    }

    if let Err(e) = state.sessions.close(&session_id) {
        debug!(session_id = %session_id, error = %e, "session close after teardown");
    }
    release_slot(&state, client_ip);

    info!(session_id = %session_id, %connection_id, "stream connection terminated");
}

/// The connection's event loop: intake, completions, idle checks.
///
/// Returns when the socket closes, errors, or idles out. In-flight provider
/// tasks are aborted on the way out — cancellation does not wait for retries
/// to exhaust — and buffered out-of-order results drop with the sequencer.
async fn run_pipeline(
    mut receiver: SplitStream<WebSocket>,
    frame_tx: &mpsc::Sender<StreamRoute>,
    client: Arc<TranscriptionClient>,
    mut sequencer: ChunkSequencer,
    high_water: usize,
    idle_timeout: Duration,
    session_id: &str,
) {
    let (done_tx, mut done_rx) = mpsc::channel::<TranscriptResult>(CHANNEL_BUFFER_SIZE);
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut next_sequence: u64 = 0;
    let mut last_activity = Instant::now();

    'conn: loop {
        // Chunks admitted but not yet emitted. At or above the high-water
        // mark the intake branch is disabled, which stops polling the socket
        // and lets transport flow control push back on the sender. Same when
        // the reorder window is full behind an unresolved head-of-line entry.
        let outstanding = (next_sequence - sequencer.next_to_emit()) as usize;
        let intake_open = outstanding < high_water && sequencer.has_capacity();

        select! {
            frame = receiver.next(), if intake_open => {
                last_activity = Instant::now();
                match frame {
                    Some(Ok(Message::Binary(payload))) => {
                        let chunk = Chunk::new(session_id.to_string(), next_sequence, payload);
                        debug!(
                            session_id = %session_id,
                            sequence = chunk.sequence,
                            bytes = chunk.payload.len(),
                            "chunk admitted"
                        );
                        next_sequence += 1;

                        let client = client.clone();
                        let done_tx = done_tx.clone();
                        tasks.spawn(async move {
                            let result = client.process(chunk).await;
                            let _ = done_tx.send(result).await;
                        });
                    }
                    Some(Ok(Message::Text(_))) => {
                        // Accepted per the wire protocol, but only binary
                        // frames carry audio
                        debug!(session_id = %session_id, "ignoring non-binary frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!(session_id = %session_id, "stream closed by client");
                        break 'conn;
                    }
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, error = %e, "stream socket error");
                        break 'conn;
                    }
                    None => {
                        info!(session_id = %session_id, "stream connection ended");
                        break 'conn;
                    }
                }
            }
            Some(result) = done_rx.recv() => {
                for ready in sequencer.accept(result) {
                    debug!(
                        session_id = %session_id,
                        sequence = ready.sequence,
                        latency_ms = ready.latency.as_millis() as u64,
                        error = ready.error.as_deref(),
                        "emitting result"
                    );
                    let frame = TranscriptFrame::from_result(&ready);
                    if frame_tx.send(StreamRoute::Result(frame)).await.is_err() {
                        warn!(session_id = %session_id, "sender task gone, tearing down");
                        break 'conn;
                    }
                }
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if last_activity.elapsed() > idle_timeout {
                    warn!(
                        session_id = %session_id,
                        idle_secs = last_activity.elapsed().as_secs(),
                        "closing idle stream connection"
                    );
                    break 'conn;
                }
            }
        }
    }

    // Cancellation is immediate: outstanding provider calls are aborted, not
    // drained, and nothing buffered is ever emitted after this point.
    tasks.abort_all();
}

/// Writer task: serializes routes onto the socket until told to close.
async fn run_sender(mut sender: SplitSink<WebSocket, Message>, mut frame_rx: mpsc::Receiver<StreamRoute>) {
    while let Some(route) = frame_rx.recv().await {
        let should_close = matches!(route, StreamRoute::Close);

        let result = match route {
            StreamRoute::Result(frame) => match serde_json::to_string(&frame) {
                Ok(json) => sender.send(Message::Text(json.into())).await,
                Err(e) => {
                    error!("failed to serialize result frame: {e}");
                    continue;
                }
            },
            StreamRoute::Close => sender.send(Message::Close(None)).await,
        };

        if let Err(e) = result {
            debug!("failed to send WebSocket message: {e}");
            break;
        }
        if should_close {
            break;
        }
    }
}
