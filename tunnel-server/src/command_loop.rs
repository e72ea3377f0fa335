use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tunnel_proto::Command;

use crate::dispatcher::{self, Decision};
use crate::session::{Session, SessionSlot};

const FAILURE_TOLERANCE: u32 = 30;
const FAILURE_BACKOFF: Duration = Duration::from_secs(1);

/// Owns the control channel connection for as long as it's adopted,
/// repeatedly reading and dispatching commands. Tolerates up to 30
/// consecutive read/dispatch failures (sleeping a second between each)
/// before giving up and tearing the session down.
///
/// `initial_lines` carries any commands the acceptor already read past
/// the `NEWCTRLCONN` that adopted this session — the client's next
/// write (e.g. `COUNTCONN`) can coalesce into that same read on a fast
/// loopback connection, and dropping it here would otherwise strand the
/// client waiting out the full read timeout for a reply that was never
/// going to come.
pub async fn run(mut conn: TcpStream, session: Arc<Session>, slot: SessionSlot, initial_lines: Vec<String>) {
    let peer_addr = session.control_addr.clone();
    let mut consecutive_failures = 0u32;
    let mut pending_lines = Some(initial_lines).filter(|lines| !lines.is_empty());

    loop {
        let outcome = match pending_lines.take() {
            Some(lines) => handle_lines(&mut conn, &session, &peer_addr, &lines).await,
            None => match tunnel_proto::read_commands(&mut conn).await {
                Ok(lines) if !lines.is_empty() => handle_lines(&mut conn, &session, &peer_addr, &lines).await,
                Ok(_) => Err("empty read".to_string()),
                Err(err) => Err(err.to_string()),
            },
        };

        match outcome {
            Ok(()) => consecutive_failures = 0,
            Err(reason) => {
                consecutive_failures += 1;
                tracing::debug!(%peer_addr, reason, consecutive_failures, "control channel hiccup");
                if consecutive_failures > FAILURE_TOLERANCE {
                    break;
                }
                tokio::time::sleep(FAILURE_BACKOFF).await;
            }
        }
    }

    slot.retire(&session);
    tracing::info!(%peer_addr, "control channel disconnected");
}

async fn handle_lines(conn: &mut TcpStream, session: &Arc<Session>, peer_addr: &str, lines: &[String]) -> Result<(), String> {
    let mut last_err = None;
    for line in lines {
        if let Err(err) = handle_one(conn, session, peer_addr, line).await {
            last_err = Some(err);
        }
    }
    match last_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_one(conn: &mut TcpStream, session: &Arc<Session>, peer_addr: &str, line: &str) -> Result<(), String> {
    let cmd = Command::parse(line).map_err(|err| err.to_string())?;

    match dispatcher::decide(Some(session.as_ref()), peer_addr, cmd) {
        Decision::ReportCount => {
            let count = session.pool.len().to_string();
            tunnel_proto::write_raw(conn, count.as_bytes()).await.map_err(|err| err.to_string())
        }
        decision => Err(format!("command {line:?} invalid on the control channel ({decision:?})")),
    }
}
