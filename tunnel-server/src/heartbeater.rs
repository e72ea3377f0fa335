use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tunnel_common::GoWorkerPool;
use tunnel_proto::Command;

use crate::session::{Session, SessionSlot};

const CYCLE: Duration = Duration::from_secs(10);
const CONCURRENCY: usize = 25;
const QUEUE: usize = 100;

/// Every cycle, probes every pooled connection for a session with a
/// CONNHEART and drops whichever ones don't answer `O` back, using a
/// bounded worker pool so a slow or hanging peer can't stall the round
/// indefinitely. Exits once its session is no longer the active one.
pub async fn run(session: Arc<Session>, slot: SessionSlot) {
    loop {
        if !slot.is_active(&session) {
            break;
        }

        let keys = session.pool.keys();
        if !keys.is_empty() {
            let mut workers = GoWorkerPool::new(CONCURRENCY, QUEUE);
            for key in keys {
                let session = Arc::clone(&session);
                workers.add_job(async move { check_one(&session, key).await }).await;
            }
            workers.wait_closed().await;
        }

        tokio::time::sleep(CYCLE).await;
    }
}

async fn check_one(session: &Session, key: String) {
    let Some(mut conn) = session.pool.cut(&key) else {
        return;
    };

    match probe(&mut conn).await {
        Ok(()) => session.pool.insert(key, conn),
        Err(err) => tracing::debug!(peer = %key, %err, "pooled connection failed its heartbeat"),
    }
}

async fn probe(conn: &mut TcpStream) -> std::io::Result<()> {
    tunnel_proto::write_command(conn, Command::ConnHeart).await?;
    let lines = tunnel_proto::read_commands(conn).await?;
    let reply = lines
        .first()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no heartbeat reply"))?;

    match Command::parse(reply)? {
        Command::Ok => Ok(()),
        other => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("heartbeat reply was {other:?}, not OK"),
        )),
    }
}
