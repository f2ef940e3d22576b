//! Both transports behind one handle.
//!
//! [`Server::bind`] claims both ports up front so a bind failure surfaces
//! before anything is served. [`Server::run`] drives the two loops
//! concurrently; the stream and datagram stores never overlap.

use crate::config::{Config, ConfigError};
use crate::connection::{ConnectionStats, DatagramError, DatagramServer, StoreRegistry, StreamServer};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, UdpSocket};
use tracing::info;

/// Errors while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("datagram transport failed: {0}")]
    Datagram(#[from] DatagramError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A bound stream listener and datagram socket, ready to serve.
pub struct Server {
    stream: StreamServer,
    datagram: DatagramServer,
    stream_addr: SocketAddr,
    datagram_addr: SocketAddr,
    stats: Arc<ConnectionStats>,
}

impl Server {
    pub async fn bind(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;

        let stream_address = config.stream_address();
        let listener = TcpListener::bind(&stream_address)
            .await
            .map_err(|source| ServerError::Bind {
                addr: stream_address,
                source,
            })?;

        let datagram_address = config.datagram_address();
        let socket = UdpSocket::bind(&datagram_address)
            .await
            .map_err(|source| ServerError::Bind {
                addr: datagram_address,
                source,
            })?;

        let stats = Arc::new(ConnectionStats::new());

        let stream = StreamServer::new(
            listener,
            config.stream_store,
            config.statistics,
            Arc::clone(&stats),
        );
        let datagram = DatagramServer::new(
            socket,
            StoreRegistry::new(config.datagram_store),
            config.datagram_workers,
            config.max_datagram_size,
            Arc::clone(&stats),
        )
        .with_idle_timeout(config.datagram_idle_timeout());

        let stream_addr = stream.local_addr()?;
        let datagram_addr = datagram.local_addr()?;

        Ok(Self {
            stream,
            datagram,
            stream_addr,
            datagram_addr,
            stats,
        })
    }

    pub fn stream_addr(&self) -> SocketAddr {
        self.stream_addr
    }

    pub fn datagram_addr(&self) -> SocketAddr {
        self.datagram_addr
    }

    /// Maps stream peers to stores.
    pub fn stream_registry(&self) -> Arc<StoreRegistry> {
        Arc::clone(self.stream.registry())
    }

    /// Maps datagram peers to stores.
    pub fn datagram_registry(&self) -> Arc<StoreRegistry> {
        Arc::clone(self.datagram.registry())
    }

    /// Shared transport counters.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Serves both transports until one of them stops.
    ///
    /// The stream loop never returns; the datagram loop returns only if its
    /// socket fails before serving starts.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(
            stream = %self.stream_addr,
            datagram = %self.datagram_addr,
            "Server ready"
        );

        tokio::select! {
            _ = self.stream.run() => Ok(()),
            result = self.datagram.run() => result.map_err(ServerError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral_config() -> Config {
        Config {
            stream_port: 0,
            datagram_port: 0,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_bind_ephemeral_ports() {
        let server = Server::bind(&ephemeral_config()).await.unwrap();
        assert_ne!(server.stream_addr().port(), 0);
        assert_ne!(server.datagram_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = Config {
            datagram_workers: 0,
            ..ephemeral_config()
        };
        assert!(matches!(
            Server::bind(&config).await,
            Err(ServerError::Config(ConfigError::NoDatagramWorkers))
        ));
    }

    #[tokio::test]
    async fn test_bind_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = Config {
            stream_port: taken.local_addr().unwrap().port(),
            ..ephemeral_config()
        };
        assert!(matches!(
            Server::bind(&config).await,
            Err(ServerError::Bind { .. })
        ));
    }
}
