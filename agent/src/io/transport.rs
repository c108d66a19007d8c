use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::handler::dispatch::Dispatcher;
use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcRequest};

/// Maximum message size: 1 MiB.
const MAX_LINE_SIZE: usize = 1_048_576;

/// Run the NDJSON transport loop over arbitrary async reader/writer.
///
/// Reads JSON-RPC messages from `reader` (one per line) and writes
/// responses to `writer`. The loop exits when the reader reaches EOF,
/// the cancellation token is triggered, or an I/O error occurs.
pub async fn run_transport_loop<R, W>(
    reader: &mut R,
    writer: &mut W,
    dispatcher: &mut Dispatcher,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncBufReadExt + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();

        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Shutdown signal received, exiting transport loop");
                break;
            }

            result = reader.read_line(&mut line) => {
                let bytes_read = result?;
                if bytes_read == 0 {
                    debug!("Reader closed (EOF), exiting transport loop");
                    break;
                }

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if trimmed.len() > MAX_LINE_SIZE {
                    warn!("Message exceeds 1 MiB limit ({} bytes)", trimmed.len());
                    let err = JsonRpcErrorResponse::new(
                        Value::Null,
                        errors::PARSE_ERROR,
                        "Message exceeds 1 MiB size limit",
                    );
                    write_json(writer, &serde_json::to_value(&err)?).await?;
                    continue;
                }

                debug!("Received: {}", trimmed);

                let request = match parse_request(trimmed) {
                    Ok(r) => r,
                    Err(err) => {
                        write_json(writer, &serde_json::to_value(&err)?).await?;
                        continue;
                    }
                };

                if let Some(result) = dispatcher.dispatch(request).await {
                    let response_json = result.to_json();
                    debug!("Sending: {}", response_json);
                    write_json(writer, &response_json).await?;
                }
            }
        }
    }

    writer.flush().await?;
    Ok(())
}

/// Decode one line into a request, or the error response to send back.
fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcErrorResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!("Failed to parse JSON-RPC message: {e}");
        JsonRpcErrorResponse::new(Value::Null, errors::PARSE_ERROR, format!("Parse error: {e}"))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        JsonRpcErrorResponse::new(
            id.clone(),
            errors::INVALID_REQUEST,
            format!("Invalid request: {e}"),
        )
    })?;

    if request.jsonrpc != "2.0" {
        return Err(JsonRpcErrorResponse::new(
            id,
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
