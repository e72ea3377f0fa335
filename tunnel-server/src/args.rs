use std::net::SocketAddr;

use clap::Parser;

/// Exposes a user-facing port and a tunnel-facing port, bridging
/// connections on the former to a pool of connections received on the
/// latter.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// User access listening address
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Tunnel working listening address
    #[arg(long, default_value = "0.0.0.0:8101")]
    pub tunnel: SocketAddr,

    /// Show debugger console logs
    #[arg(long)]
    pub debug: bool,
}
