use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::files::local::LocalFileBackend;
use crate::handler::dispatch::Dispatcher;
use crate::handler::tools::ToolRunner;
use crate::io::transport::run_transport_loop;

/// Run the NDJSON stdio transport loop.
///
/// Reads JSON-RPC messages from stdin (one per line) and writes
/// responses to stdout. Logs go to stderr.
pub async fn run_stdio_loop(shutdown: CancellationToken) -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::new(ToolRunner::new(LocalFileBackend::new()));

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    info!("Stdio transport loop started, waiting for input");
    run_transport_loop(&mut reader, &mut stdout, &mut dispatcher, shutdown).await?;
    info!("Stdio transport loop finished");

    Ok(())
}
