use std::net::SocketAddr;

use clap::Parser;

/// Maintains a pool of outbound connections to a tunnel server and
/// forwards whatever traffic arrives on them to a local origin service.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Tunnel server address
    #[arg(long, default_value = "127.0.0.1:8101")]
    pub tunnel: SocketAddr,

    /// Origin (proxied) server address
    #[arg(long, default_value = "127.0.0.1:80")]
    pub proxy: SocketAddr,

    /// Target number of idle pooled connections to maintain
    #[arg(long, default_value_t = 25)]
    pub maxconn: u32,

    /// Show debugger console logs
    #[arg(long)]
    pub debug: bool,

    /// Caps each pooled connection's data transfer to this many
    /// kilobytes per second in either direction. Unset means unlimited.
    #[arg(long = "rate-limit-kbps")]
    pub rate_limit_kbps: Option<u32>,
}
