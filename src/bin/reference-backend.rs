use std::io;

use clap::Parser;
use mcp_stdio_bridge::{logging, reference::ReferenceServer};

/// Deterministic stdio JSON-RPC backend with a fixed paper corpus.
#[derive(Debug, Parser)]
#[command(name = "reference-backend", version)]
struct Cli {
    /// Server name reported by `initialize`; also selects the tool catalog.
    #[arg(long, default_value = "semantic_scholar")]
    name: String,
}

fn main() -> io::Result<()> {
    logging::init_stderr_logging("warn");
    let cli = Cli::parse();

    let server = ReferenceServer::new(cli.name);
    server.serve(io::stdin().lock(), io::stdout().lock())
}
