//! TCP accept loop.
//!
//! One task is spawned per accepted connection, with no upper bound on the
//! number of live sessions. A client that never sends QUIT and never closes
//! its socket keeps its task and store alive indefinitely; there are no idle
//! timeouts.

use crate::commands::CommandHandler;
use crate::config::{StatisticsPolicy, StoreScope};
use crate::connection::handler::handle_connection;
use crate::connection::registry::StoreRegistry;
use crate::connection::stats::ConnectionStats;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Serves the stream transport.
pub struct StreamServer {
    listener: TcpListener,
    registry: Arc<StoreRegistry>,
    policy: StatisticsPolicy,
    stats: Arc<ConnectionStats>,
}

impl StreamServer {
    pub fn new(
        listener: TcpListener,
        scope: StoreScope,
        policy: StatisticsPolicy,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            listener,
            registry: Arc::new(StoreRegistry::new(scope)),
            policy,
            stats,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The registry mapping connected peers to stores.
    pub fn registry(&self) -> &Arc<StoreRegistry> {
        &self.registry
    }

    /// Main loop that accepts incoming connections.
    ///
    /// Accept failures are logged and the loop keeps going.
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(addr = %addr, store = %self.registry.scope(), "Stream transport listening");
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let store = self.registry.acquire(addr);
                    let handler = CommandHandler::with_policy(store, self.policy);
                    let registry = Arc::clone(&self.registry);
                    let stats = Arc::clone(&self.stats);

                    tokio::spawn(async move {
                        let state = handle_connection(stream, addr, handler, stats).await;
                        registry.release(&addr);
                        debug!(client = %addr, state = ?state, "Session ended");
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StreamClient;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    async fn create_test_server(scope: StoreScope) -> (SocketAddr, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stats = Arc::new(ConnectionStats::new());
        let server = StreamServer::new(
            listener,
            scope,
            StatisticsPolicy::ExcludeSelf,
            Arc::clone(&stats),
        );
        let addr = server.local_addr().unwrap();

        tokio::spawn(server.run());

        (addr, stats)
    }

    fn listed_keys(response: &str) -> Vec<String> {
        let listed = response.strip_prefix("Success! Keys: ").unwrap_or("");
        let mut keys: Vec<String> = listed.split(':').map(String::from).collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_put_get() {
        let (addr, _) = create_test_server(StoreScope::PerClient).await;
        let mut client = StreamClient::connect(addr).await.unwrap();

        let response = client.request("PUT name Ariz").await.unwrap();
        assert_eq!(
            response,
            "Success: Key-Value Pair saved on the server. Key: name, Value: Ariz"
        );

        let response = client.request("GET name").await.unwrap();
        assert_eq!(
            response,
            "Success: Key found in the store. Key: name, Value: Ariz"
        );
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (addr, _) = create_test_server(StoreScope::PerClient).await;

        let mut first = StreamClient::connect(addr).await.unwrap();
        let mut second = StreamClient::connect(addr).await.unwrap();

        let (a, b) = tokio::join!(first.request("PUT same one"), second.request("PUT same two"));
        assert!(a.unwrap().starts_with("Success"));
        assert!(b.unwrap().starts_with("Success"));

        first.request("PUT only1 x").await.unwrap();
        second.request("PUT only2 y").await.unwrap();

        let first_keys = listed_keys(&first.request("KEYS").await.unwrap());
        let second_keys = listed_keys(&second.request("KEYS").await.unwrap());
        assert_eq!(first_keys, vec!["only1", "same"]);
        assert_eq!(second_keys, vec!["only2", "same"]);

        assert_eq!(
            first.request("GET same").await.unwrap(),
            "Success: Key found in the store. Key: same, Value: one"
        );
    }

    #[tokio::test]
    async fn test_shared_stream_scope() {
        let (addr, _) = create_test_server(StoreScope::Shared).await;

        let mut first = StreamClient::connect(addr).await.unwrap();
        let mut second = StreamClient::connect(addr).await.unwrap();

        first.request("PUT key value").await.unwrap();
        assert_eq!(
            second.request("GET key").await.unwrap(),
            "Success: Key found in the store. Key: key, Value: value"
        );
    }

    #[tokio::test]
    async fn test_fresh_store_per_connection() {
        let (addr, _) = create_test_server(StoreScope::PerClient).await;

        let mut client = StreamClient::connect(addr).await.unwrap();
        client.request("PUT key value").await.unwrap();
        client.request("QUIT").await.unwrap();

        let mut client = StreamClient::connect(addr).await.unwrap();
        assert_eq!(
            client.request("KEYS").await.unwrap(),
            "There are no keys in the store."
        );
    }

    #[tokio::test]
    async fn test_statistics_reset_per_connection() {
        let (addr, _) = create_test_server(StoreScope::PerClient).await;

        let mut client = StreamClient::connect(addr).await.unwrap();
        client.request("PUT a 1").await.unwrap();
        client.request("GET a").await.unwrap();
        client.request("GET a").await.unwrap();
        client.request("DELETE a").await.unwrap();
        assert_eq!(
            client.request("STATISTICS").await.unwrap(),
            "Command statistics:\nPUT: 1\nGET: 2\nDELETE: 1\nKEYS: 0\nQUIT: 0\n"
        );
        client.request("QUIT").await.unwrap();

        let mut client = StreamClient::connect(addr).await.unwrap();
        assert_eq!(
            client.request("STATISTICS").await.unwrap(),
            "Command statistics:\nPUT: 0\nGET: 0\nDELETE: 0\nKEYS: 0\nQUIT: 0\n"
        );
    }

    #[tokio::test]
    async fn test_quit_closes_connection() {
        let (addr, stats) = create_test_server(StoreScope::PerClient).await;

        let mut client = StreamClient::connect(addr).await.unwrap();
        assert_eq!(
            client.request("QUIT").await.unwrap(),
            "You have disconnected from the server!"
        );

        // The server stops serving: further requests get no response
        let _ = client.send("KEYS").await;
        assert!(client.recv().await.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_gets_no_response() {
        let (addr, _) = create_test_server(StoreScope::PerClient).await;

        let mut client = StreamClient::connect(addr).await.unwrap();
        client.send("BOGUS").await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(100), client.recv()).await;
        assert!(waited.is_err(), "no response expected for unknown verb");

        // The session is still serving
        assert_eq!(
            client.request("KEYS").await.unwrap(),
            "There are no keys in the store."
        );
    }
}
