use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tunnel_proto::Command;

use crate::pooled_worker;

const POLL_DELAY: Duration = Duration::from_millis(500);
const FAILURE_TOLERANCE: u32 = 10;

/// Dials the tunnel server once as the control channel, then repeatedly
/// asks how many pooled connections it currently has and dials new ones
/// up to `target_pool_size`. Gives up (returning an error so the caller
/// can reconnect from scratch) after 10 consecutive control-channel
/// failures.
pub async fn run(tunnel_addr: SocketAddr, target_pool_size: u32, proxy_addr: SocketAddr, rate_limit_kbps: Option<u32>) -> io::Result<()> {
    let mut ctrl = TcpStream::connect(tunnel_addr).await?;
    tunnel_proto::write_command(&mut ctrl, Command::NewCtrlConn).await?;
    tracing::info!(%tunnel_addr, "connected to tunnel server");

    let mut consecutive_failures = 0u32;
    loop {
        match poll_once(&mut ctrl, tunnel_addr, target_pool_size, proxy_addr, rate_limit_kbps).await {
            Ok(()) => consecutive_failures = 0,
            Err(err) => {
                consecutive_failures += 1;
                tracing::info!(%err, consecutive_failures, "control channel communication error");
                if consecutive_failures > FAILURE_TOLERANCE {
                    return Err(err);
                }
                tokio::time::sleep(POLL_DELAY).await;
            }
        }
    }
}

/// Reports the pool size and, if it's under `target`, dials one more
/// pooled connection right away. Only sleeps when the pool is already
/// at or above target — growth proceeds tick-to-tick with no delay.
async fn poll_once(ctrl: &mut TcpStream, tunnel_addr: SocketAddr, target: u32, proxy_addr: SocketAddr, rate_limit_kbps: Option<u32>) -> io::Result<()> {
    tunnel_proto::write_command(ctrl, Command::CountConn).await?;
    let lines = tunnel_proto::read_commands(ctrl).await?;
    let count: u32 = lines
        .first()
        .and_then(|line| line.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed COUNTCONN reply"))?;

    if count >= target {
        tokio::time::sleep(POLL_DELAY).await;
        return Ok(());
    }

    if let Err(err) = dial_pooled_connection(tunnel_addr, proxy_addr, rate_limit_kbps).await {
        tracing::info!(%err, "failed to add a pooled connection");
    }

    Ok(())
}

async fn dial_pooled_connection(tunnel_addr: SocketAddr, proxy_addr: SocketAddr, rate_limit_kbps: Option<u32>) -> io::Result<()> {
    let mut conn = TcpStream::connect(tunnel_addr).await?;
    tunnel_proto::write_command(&mut conn, Command::NewUserConn).await?;
    tokio::spawn(pooled_worker::run(conn, proxy_addr, rate_limit_kbps));
    Ok(())
}
