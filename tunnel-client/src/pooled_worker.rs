use std::net::SocketAddr;

use tokio::net::TcpStream;
use tunnel_proto::Command;

/// Owns one enrolled pooled connection, answering whatever the server
/// sends it until told to start transporting data or the connection
/// fails.
pub async fn run(mut conn: TcpStream, proxy_addr: SocketAddr, rate_limit_kbps: Option<u32>) {
    loop {
        let lines = match tunnel_proto::read_commands(&mut conn).await {
            Ok(lines) => lines,
            Err(err) => {
                tracing::debug!(%err, "pooled connection read failed");
                return;
            }
        };

        let Some(line) = lines.first() else {
            tracing::debug!("pooled connection read returned no command");
            return;
        };

        let cmd = match Command::parse(line) {
            Ok(cmd) => cmd,
            Err(err) => {
                tracing::debug!(%err, "pooled connection received an unrecognized command");
                return;
            }
        };

        match cmd {
            Command::StartTransport => {
                start_transport(conn, proxy_addr, rate_limit_kbps).await;
                return;
            }
            Command::ConnHeart => {
                if let Err(err) = tunnel_proto::write_command(&mut conn, Command::Ok).await {
                    tracing::debug!(%err, "failed to ack heartbeat");
                    return;
                }
            }
            _ => return,
        }
    }
}

async fn start_transport(mut conn: TcpStream, proxy_addr: SocketAddr, rate_limit_kbps: Option<u32>) {
    // Unframed ack: a bare "O" with no trailing newline, matching the
    // server's rendezvous read.
    if let Err(err) = tunnel_proto::write_raw(&mut conn, &[Command::Ok.token()]).await {
        tracing::debug!(%err, "failed to ack transport start");
        return;
    }

    let origin = match TcpStream::connect(proxy_addr).await {
        Ok(origin) => origin,
        Err(err) => {
            tracing::debug!(%proxy_addr, %err, "failed to dial the origin service");
            return;
        }
    };

    if let Err(err) = tunnel_common::exchange(conn, origin, rate_limit_kbps).await {
        tracing::debug!(%err, "exchange ended with an error");
    }
}
