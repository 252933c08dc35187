//! Newline-delimited JSON-RPC transport.
//!
//! One message per line in both directions. Every line is handled on its own
//! task, so a slow tool call never blocks `ping`, `tools/list` or the
//! cancellation of that same call; a single writer task serializes the
//! responses, which may therefore arrive out of request order.

use crate::error::ServerError;
use crate::server::ToolServer;
use apiscope_protocol::JsonRpcResponse;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Serves requests read from `reader` until it reaches end of input.
///
/// Calls still running at end of input get the server's
/// [shutdown grace](ToolServer::shutdown_grace) to finish. After that they are
/// cancelled, and calls that ignore cancellation for another grace period are
/// aborted without a response.
///
/// # Errors
///
/// Returns [`ServerError`] if reading or writing fails.
pub async fn serve<R, W>(server: Arc<ToolServer>, reader: R, writer: W) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
    let writer_task = tokio::spawn(write_responses(rx, writer));

    let mut lines = BufReader::new(reader).lines();
    let mut tasks = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let server = Arc::clone(&server);
        let tx = tx.clone();
        tasks.spawn(async move {
            if let Some(response) = server.handle_message(&line).await
                && tx.send(response).is_err()
            {
                tracing::warn!("response dropped: writer has stopped");
            }
        });

        while let Some(finished) = tasks.try_join_next() {
            log_task_outcome(finished);
        }
    }

    tracing::debug!(pending = tasks.len(), "end of input, draining in-flight calls");
    let grace = server.shutdown_grace();
    if tokio::time::timeout(grace, drain(&mut tasks)).await.is_err() {
        tracing::warn!(pending = tasks.len(), "calls outlived the shutdown grace, cancelling");
        server.cancel_all();
        if tokio::time::timeout(grace, drain(&mut tasks)).await.is_err() {
            tracing::warn!(pending = tasks.len(), "calls ignored cancellation, aborting");
            tasks.abort_all();
            drain(&mut tasks).await;
        }
    }

    drop(tx);
    writer_task.await?
}

/// Serves requests on the process's stdin and stdout.
///
/// # Errors
///
/// See [`serve`].
pub async fn serve_stdio(server: Arc<ToolServer>) -> Result<(), ServerError> {
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
    mut writer: W,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(finished) = tasks.join_next().await {
        log_task_outcome(finished);
    }
}

fn log_task_outcome(outcome: Result<(), tokio::task::JoinError>) {
    if let Err(err) = outcome {
        tracing::error!(error = %err, "request task failed");
    }
}
