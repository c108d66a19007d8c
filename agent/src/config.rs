//! Command-line configuration.

use std::path::PathBuf;

/// What the process was asked to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Run(AgentConfig),
    Version,
    Help,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AgentConfig {
    /// Directory relative paths resolve against; the launch directory when unset.
    pub workdir: Option<PathBuf>,
}

pub fn print_usage() {
    eprintln!("Usage: filemanager-agent --stdio [--workdir <DIR>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio           Run in stdio mode (NDJSON over stdin/stdout)");
    eprintln!("  --workdir <DIR>   Working directory for relative paths (~ is expanded)");
    eprintln!("  --version         Print version and exit");
    eprintln!("  --help            Print this help message");
    eprintln!();
    eprintln!("Logging is controlled with RUST_LOG (default: info), written to stderr.");
}

/// Parse arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<Invocation, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut stdio = false;
    let mut config = AgentConfig::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" => return Ok(Invocation::Version),
            "--help" => return Ok(Invocation::Help),
            "--stdio" => stdio = true,
            "--workdir" => {
                let raw = args
                    .next()
                    .ok_or_else(|| "--workdir requires a directory".to_string())?;
                let expanded = shellexpand::tilde(&raw);
                config.workdir = Some(PathBuf::from(expanded.as_ref()));
            }
            other => return Err(format!("Unknown option: {other}")),
        }
    }

    if stdio {
        Ok(Invocation::Run(config))
    } else {
        Err("missing --stdio".to_string())
    }
}
