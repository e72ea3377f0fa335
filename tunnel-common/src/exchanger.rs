use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::rate_limit::RateLimiter;
use crate::EXCHANGE_BUFFER_SIZE;

/// Byte counts copied in each direction of an [`exchange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeStats {
    pub a_to_b: u64,
    pub b_to_a: u64,
}

/// Bridges `a` and `b` into a single bidirectional byte pipe.
///
/// Both connections are expected to already have their read/write
/// deadlines cleared (the caller owns them fresh off a dial or accept, so
/// there's nothing to clear) — the copy loops here never apply one.
///
/// As soon as either direction finishes (EOF or error), the other
/// direction's task is aborted and joined before this function returns,
/// so neither socket outlives the exchange and the aborted side never
/// gets a chance to log a spurious error about a connection that was
/// closed out from under it.
///
/// `rate_limit_kbps`, when set, throttles both directions independently
/// to that many kilobytes per second.
pub async fn exchange(a: TcpStream, b: TcpStream, rate_limit_kbps: Option<u32>) -> io::Result<ExchangeStats> {
    let (a_read, a_write) = a.into_split();
    let (b_read, b_write) = b.into_split();

    let limiter_ab = rate_limit_kbps.map(RateLimiter::new);
    let limiter_ba = rate_limit_kbps.map(RateLimiter::new);

    let mut task_ab = tokio::spawn(copy_buffered(a_read, b_write, limiter_ab));
    let mut task_ba = tokio::spawn(copy_buffered(b_read, a_write, limiter_ba));

    let (a_to_b, b_to_a) = tokio::select! {
        result = &mut task_ab => {
            task_ba.abort();
            let b_to_a = task_ba.await.unwrap_or(Ok(0)).unwrap_or(0);
            (result.unwrap_or(Ok(0))?, b_to_a)
        }
        result = &mut task_ba => {
            task_ab.abort();
            let a_to_b = task_ab.await.unwrap_or(Ok(0)).unwrap_or(0);
            (a_to_b, result.unwrap_or(Ok(0))?)
        }
    };

    Ok(ExchangeStats { a_to_b, b_to_a })
}

/// Copies `reader` into `writer` using a fixed-size buffer, optionally
/// throttled by `limiter`, until EOF or an error.
async fn copy_buffered<R, W>(mut reader: R, mut writer: W, mut limiter: Option<RateLimiter>) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; EXCHANGE_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        if let Some(limiter) = limiter.as_mut() {
            limiter.acquire(n as u64).await;
        }

        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn copy_buffered_counts_bytes_and_stops_on_eof() {
        let (mut client, server) = duplex(64);
        client.write_all(b"hello").await.unwrap();
        drop(client);

        let n = copy_buffered(server, tokio::io::sink(), None).await.unwrap();
        assert_eq!(n, 5);
    }

    #[tokio::test]
    async fn exchange_bridges_both_directions_and_stops_when_one_side_closes() {
        let listener_a = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr_a = listener_a.local_addr().unwrap();
        let listener_b = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr_b = listener_b.local_addr().unwrap();

        let (client_a, accept_a) = tokio::join!(TcpStream::connect(addr_a), listener_a.accept());
        let mut client_a = client_a.unwrap();
        let (server_a, _) = accept_a.unwrap();

        let (client_b, accept_b) = tokio::join!(TcpStream::connect(addr_b), listener_b.accept());
        let mut client_b = client_b.unwrap();
        let (server_b, _) = accept_b.unwrap();

        // exchange() bridges server_a <-> server_b; client_a/client_b are the
        // two peers the test drives directly.
        let exchange_handle = tokio::spawn(exchange(server_a, server_b, None));

        client_a.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        client_b.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        drop(client_a);
        drop(client_b);

        let stats = exchange_handle.await.unwrap().unwrap();
        assert_eq!(stats.a_to_b, 4);
    }
}
