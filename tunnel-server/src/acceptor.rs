use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tunnel_proto::Command;

use crate::command_loop;
use crate::dispatcher::{self, Decision};
use crate::heartbeater;
use crate::session::SessionSlot;

/// Accepts tunnel-facing connections and dispatches the first command
/// each one sends: NEWCTRLCONN adopts a new control channel and hands
/// the connection off to the command loop; NEWUSERCONN enrolls the
/// connection into the active session's pool. Anything else closes it.
pub async fn run(listener: TcpListener, slot: SessionSlot) {
    loop {
        let (conn, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::error!(%err, "tunnel accept failed");
                continue;
            }
        };

        let slot = slot.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_new_connection(conn, peer_addr, slot).await {
                tracing::debug!(%peer_addr, %err, "tunnel connection closed");
            }
        });
    }
}

async fn handle_new_connection(mut conn: TcpStream, peer_addr: SocketAddr, slot: SessionSlot) -> io::Result<()> {
    let mut lines = tunnel_proto::read_commands(&mut conn).await?.into_iter();
    let Some(first) = lines.next() else {
        return Ok(());
    };

    let cmd = Command::parse(&first)?;
    let peer_addr = peer_addr.to_string();
    let current = slot.current();

    match dispatcher::decide(current.as_deref(), &peer_addr, cmd) {
        Decision::AdoptControl => {
            let session = slot.try_adopt(peer_addr.clone()).ok_or_else(|| {
                io::Error::new(io::ErrorKind::AlreadyExists, "a control channel is already connected")
            })?;
            tracing::info!(%peer_addr, "control channel connected");
            tokio::spawn(heartbeater::run(session.clone(), slot.clone()));
            // Any commands that coalesced into this same read past the
            // NEWCTRLCONN token (e.g. a COUNTCONN written right after, with
            // no pause between, on a fast loopback link) belong to the
            // command loop, not this one-shot dispatch.
            command_loop::run(conn, session, slot, lines.collect()).await;
            Ok(())
        }
        Decision::EnrollUser => {
            if let Some(session) = current {
                session.pool.insert(peer_addr, conn);
            }
            Ok(())
        }
        Decision::ReportCount | Decision::Reject => Err(io::Error::new(io::ErrorKind::InvalidData, "invalid command for a new connection")),
    }
}
