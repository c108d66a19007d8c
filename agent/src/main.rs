mod config;
mod files;
mod handler;
mod io;
mod protocol;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{parse_args, print_usage, Invocation};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match invocation {
        Invocation::Version => {
            println!("filemanager-agent {}", VERSION);
            return Ok(());
        }
        Invocation::Help => {
            print_usage();
            return Ok(());
        }
        Invocation::Run(config) => config,
    };

    // Configure tracing to stderr so it doesn't interfere with the protocol on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(dir) = &config.workdir {
        std::env::set_current_dir(dir)
            .map_err(|e| anyhow::anyhow!("cannot enter working directory {}: {e}", dir.display()))?;
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    info!(
        "filemanager-agent {} starting in stdio mode (cwd: {})",
        VERSION,
        std::env::current_dir()?.display()
    );
    io::stdio::run_stdio_loop(shutdown).await
}
