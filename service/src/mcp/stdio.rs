//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Each request runs on its own task, so a slow upstream call never blocks
//! the reader. `notifications/cancelled` aborts the matching task, which
//! drops its in-flight upstream request; no response is written for it.
//! Responses are funnelled through a single writer task so frames never
//! interleave.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;

use super::{
    parse_message, JsonRpcRequest, JsonRpcResponse, ServerError, ToolServer, INVALID_REQUEST,
    NOTIFICATION_CANCELLED,
};
use crate::congress::RequestContext;

type InFlight = Arc<Mutex<HashMap<String, AbortHandle>>>;

/// Serve on the process's stdin/stdout until stdin closes.
///
/// # Errors
/// Returns an error if stdin or stdout fails.
pub async fn serve_stdio(server: ToolServer) -> Result<(), ServerError> {
    let ctx = RequestContext::default().with_session(format!("stdio-{}", std::process::id()));
    tracing::info!("server running (stdio)");
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout(), ctx).await?;
    tracing::info!("stdin closed; stdio server stopped");
    Ok(())
}

/// Serve one connection until `reader` reaches EOF and every in-flight
/// request has finished or been cancelled. Returns the writer.
///
/// # Errors
/// Returns an error if reading or writing fails.
pub async fn serve<R, W>(
    server: ToolServer,
    reader: R,
    writer: W,
    ctx: RequestContext,
) -> Result<W, ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_frames(writer, rx));
    let in_flight: InFlight = Arc::default();

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request = match parse_message(line) {
            Ok(request) => request,
            Err(response) => {
                send(&tx, &response);
                continue;
            }
        };
        if request.method == NOTIFICATION_CANCELLED {
            cancel(&in_flight, request.params.as_ref()).await;
            continue;
        }
        dispatch(&server, request, &ctx, &tx, &in_flight).await;
    }

    // The writer finishes once every task has dropped its sender.
    drop(tx);
    let writer = writer_task.await.map_err(std::io::Error::other)??;
    Ok(writer)
}

async fn write_frames<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        writer.write_all(frame.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(writer)
}

fn send(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(frame) => {
            if tx.send(frame).is_err() {
                tracing::warn!("stdout writer closed; dropping response");
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to serialize response"),
    }
}

async fn dispatch(
    server: &ToolServer,
    request: JsonRpcRequest,
    ctx: &RequestContext,
    tx: &mpsc::UnboundedSender<String>,
    in_flight: &InFlight,
) {
    let key = request.id.as_ref().map(Value::to_string);
    let task_key = key.clone();
    let server = server.clone();
    let ctx = ctx.clone();
    let tx = tx.clone();
    let registry = Arc::clone(in_flight);

    // Registered under the lock so the task cannot deregister before it is inserted.
    let mut tasks = in_flight.lock().await;
    if let Some(key) = key.as_ref().filter(|key| tasks.contains_key(*key)) {
        tracing::warn!(request_id = %key, "request id already in flight");
        send(
            &tx,
            &JsonRpcResponse::failure(
                request.id,
                INVALID_REQUEST,
                format!("Request id {key} is already in flight."),
            ),
        );
        return;
    }
    let handle = tokio::spawn(async move {
        if let Some(response) = server.handle(request, &ctx).await {
            send(&tx, &response);
        }
        if let Some(key) = task_key {
            registry.lock().await.remove(&key);
        }
    });
    if let Some(key) = key {
        tasks.insert(key, handle.abort_handle());
    }
}

async fn cancel(in_flight: &InFlight, params: Option<&Value>) {
    let Some(request_id) = params.and_then(|p| p.get("requestId")) else {
        tracing::debug!("cancellation without requestId ignored");
        return;
    };
    let key = request_id.to_string();
    let handle = in_flight.lock().await.remove(&key);
    match handle {
        Some(handle) => {
            handle.abort();
            tracing::info!(request_id = %key, "request cancelled");
        }
        None => tracing::debug!(request_id = %key, "cancellation for unknown or finished request"),
    }
}
