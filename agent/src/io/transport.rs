use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::handler::dispatch::Dispatcher;
use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest};

/// Maximum message size: 1 MiB.
const MAX_LINE_SIZE: usize = 1_048_576;

/// Sender half for engine adapters to emit notifications.
pub type NotificationSender = UnboundedSender<JsonRpcNotification>;

/// Run the NDJSON transport loop over arbitrary async reader/writer.
///
/// Reads JSON-RPC requests from `reader` (one per line) and writes
/// responses to `writer`. Notifications from the engine adapters are
/// interleaved via `tokio::select!`. The loop exits when the reader
/// reaches EOF, the cancellation token is triggered, or an I/O error
/// occurs.
pub async fn run_transport_loop<R, W>(
    reader: &mut R,
    writer: &mut W,
    dispatcher: &mut Dispatcher,
    notification_rx: &mut UnboundedReceiver<JsonRpcNotification>,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWriteExt + Unpin,
{
    // `next_line` is cancel-safe: a partial line survives a lost select.
    let mut lines = reader.lines();

    loop {
        // Pending notifications go out before the next request is read.
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("Shutdown signal received, exiting transport loop");
                break;
            }

            Some(notification) = notification_rx.recv() => {
                let json = serde_json::to_value(&notification)?;
                debug!("Sending notification: {}", json);
                write_json(writer, &json).await?;
            }

            result = lines.next_line() => {
                let Some(text) = result? else {
                    debug!("Reader closed (EOF), exiting transport loop");
                    break;
                };
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let reply = match parse_request(trimmed) {
                    Ok(request) => dispatcher.dispatch(request).await.to_json(),
                    Err(err) => serde_json::to_value(&err)?,
                };
                debug!("Sending: {}", reply);
                write_json(writer, &reply).await?;
            }
        }
    }

    Ok(())
}

/// Parse and validate one request line.
fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcErrorResponse> {
    if line.len() > MAX_LINE_SIZE {
        warn!("Message exceeds 1 MiB limit ({} bytes)", line.len());
        return Err(JsonRpcErrorResponse::new(
            Value::Null,
            errors::PARSE_ERROR,
            "Message exceeds 1 MiB size limit",
        ));
    }

    debug!("Received: {}", line);

    let request: JsonRpcRequest = serde_json::from_str(line).map_err(|e| {
        warn!("Failed to parse JSON-RPC request: {e}");
        JsonRpcErrorResponse::new(Value::Null, errors::PARSE_ERROR, format!("Parse error: {e}"))
    })?;

    if request.jsonrpc != "2.0" {
        return Err(JsonRpcErrorResponse::new(
            request.id,
            errors::INVALID_REQUEST,
            "Invalid JSON-RPC version (must be \"2.0\")",
        ));
    }
    Ok(request)
}

/// Write a JSON value as an NDJSON line to the writer.
pub async fn write_json<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    value: &Value,
) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
