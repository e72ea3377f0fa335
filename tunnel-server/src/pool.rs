use dashmap::DashMap;
use tokio::net::TcpStream;

/// The set of idle tunnel connections a session currently has on offer,
/// keyed by the connection's remote address.
///
/// Backed by `DashMap` rather than a `Mutex<HashMap>` so the heartbeater
/// and the rendezvous path can cut different entries concurrently
/// without contending on a single lock.
#[derive(Default)]
pub struct Pool {
    conns: DashMap<String, TcpStream>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `key`.
    pub fn insert(&self, key: String, conn: TcpStream) {
        self.conns.insert(key, conn);
    }

    /// Atomically removes and returns the entry for `key`, if present.
    pub fn cut(&self, key: &str) -> Option<TcpStream> {
        self.conns.remove(key).map(|(_, conn)| conn)
    }

    /// A snapshot of the currently-held keys.
    pub fn keys(&self) -> Vec<String> {
        self.conns.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Removes every entry, dropping (and so closing) each connection.
    pub fn clear(&self) {
        self.conns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cut_removes_and_returns_the_entry() {
        let pool = Pool::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (a, _) = tokio::join!(TcpStream::connect(addr), listener.accept());
        pool.insert("peer-a".to_string(), a.unwrap());

        assert_eq!(pool.len(), 1);
        assert!(pool.cut("peer-a").is_some());
        assert!(pool.cut("peer-a").is_none());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn clear_drops_every_entry() {
        let pool = Pool::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        for i in 0..3 {
            let (conn, _) = tokio::join!(TcpStream::connect(addr), listener.accept());
            pool.insert(format!("peer-{i}"), conn.unwrap());
        }

        assert_eq!(pool.len(), 3);
        pool.clear();
        assert!(pool.is_empty());
    }
}
