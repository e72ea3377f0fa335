use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::rendezvous;
use crate::session::SessionSlot;

const RENDEZVOUS_RETRIES: u32 = 600;
const RENDEZVOUS_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accepts user-facing connections and bridges each one to a pooled
/// tunnel connection. Retries the rendezvous for up to a minute (600
/// attempts, 100ms apart) to ride out a client that's momentarily
/// between reconnects, then gives up on that user connection.
pub async fn run(listener: TcpListener, slot: SessionSlot) {
    loop {
        let (conn, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::error!(%err, "user accept failed");
                continue;
            }
        };

        let slot = slot.clone();
        tokio::spawn(async move {
            handle_user_connection(conn, peer_addr, slot).await;
        });
    }
}

async fn handle_user_connection(user_conn: TcpStream, peer_addr: SocketAddr, slot: SessionSlot) {
    for _ in 0..RENDEZVOUS_RETRIES {
        if let Some(session) = slot.current() {
            if let Some(pooled) = rendezvous::get_conn(&session).await {
                tracing::debug!(%peer_addr, "exchange starting");
                match tunnel_common::exchange(user_conn, pooled, None).await {
                    Ok(stats) => {
                        tracing::debug!(%peer_addr, a_to_b = stats.a_to_b, b_to_a = stats.b_to_a, "exchange finished");
                    }
                    Err(err) => tracing::debug!(%peer_addr, %err, "exchange failed"),
                }
                return;
            }
        }

        tokio::time::sleep(RENDEZVOUS_RETRY_DELAY).await;
    }

    tracing::debug!(%peer_addr, "no tunnel connection became available, dropping user connection");
}
