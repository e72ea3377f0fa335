use tokio::net::TcpStream;
use tunnel_proto::Command;

use crate::session::Session;

/// Tries each pooled connection in turn, telling it to start
/// transporting and waiting for its acknowledgement, until one accepts
/// or the pool is exhausted.
pub async fn get_conn(session: &Session) -> Option<TcpStream> {
    for key in session.pool.keys() {
        let Some(mut conn) = session.pool.cut(&key) else {
            continue;
        };

        if let Err(err) = tunnel_proto::write_command(&mut conn, Command::StartTransport).await {
            tracing::debug!(peer = %key, %err, "failed to signal transport start");
            continue;
        }

        let reply = match tunnel_proto::read_commands(&mut conn).await {
            Ok(lines) => lines,
            Err(err) => {
                tracing::debug!(peer = %key, %err, "failed to read transport-start reply");
                continue;
            }
        };

        match reply.first().map(|line| Command::parse(line)) {
            Some(Ok(Command::Ok)) => return Some(conn),
            Some(Ok(other)) => {
                tracing::debug!(peer = %key, ?other, "unexpected transport-start reply");
                continue;
            }
            Some(Err(err)) => {
                tracing::debug!(peer = %key, %err, "malformed transport-start reply");
                continue;
            }
            None => continue,
        }
    }

    None
}
