//! API server entry point.
//!
//! Binds localhost, announces the bound port on stdout, then serves. The
//! announcement must be the only protocol traffic on stdout, so tracing is
//! routed to stderr.

mod routes;

use anyhow::Result;
use clap::Parser;
use roost_core::announce::announcement_line;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "roost-server", about = "Local JSON API server for the roost shell")]
struct Args {
    /// Port to listen on; 0 or omitted means an OS-assigned ephemeral port
    port: Option<u16>,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let requested = args.port.unwrap_or(0);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", requested)).await?;
    let port = listener.local_addr()?.port();

    // The socket is bound, so the parent may connect as soon as it sees
    // this line. stdout is line-buffered; the newline flushes it.
    println!("{}", announcement_line(port));
    info!("Server starting on http://localhost:{port}");

    axum::serve(listener, routes::router()).await?;
    Ok(())
}
