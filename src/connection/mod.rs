//! Session Management Module
//!
//! This module binds clients to stores and drives their request/response
//! exchanges on both transports.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │  StreamServer (TCP)          │   │  DatagramServer (UDP)        │
//! │  accept() -> spawn per conn  │   │  recv_from() -> pooled task  │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                │                                  │
//!                ▼                                  │
//! ┌──────────────────────────────┐                  │
//! │  ConnectionHandler           │                  │
//! │  frames -> Session           │                  │
//! │  (CommandLog per session)    │                  │
//! └──────────────┬───────────────┘                  │
//!                ▼                                  ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  StoreRegistry: client address -> SharedStore (per scope)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Uses Tokio for non-blocking network operations
//! - **Isolation**: Per-client or shared stores, chosen per transport
//! - **Bounded UDP pool**: A semaphore caps in-flight datagrams
//! - **Idle eviction**: Quiet per-client UDP stores are swept away
//! - **Statistics**: Tracks connection and command metrics
//!
//! ## Example
//!
//! ```ignore
//! use duokv::config::{StatisticsPolicy, StoreScope};
//! use duokv::connection::{ConnectionStats, StreamServer};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! let listener = TcpListener::bind("127.0.0.1:8080").await?;
//! let stats = Arc::new(ConnectionStats::new());
//! let server = StreamServer::new(listener, StoreScope::PerClient, StatisticsPolicy::ExcludeSelf, stats);
//! server.run().await;
//! ```

pub mod datagram;
pub mod handler;
pub mod listener;
pub mod registry;
pub mod session;
pub mod stats;
pub mod sweeper;

// Re-export commonly used types
pub use datagram::{DatagramError, DatagramServer};
pub use handler::{handle_connection, ConnectionError, ConnectionHandler};
pub use listener::StreamServer;
pub use registry::StoreRegistry;
pub use session::{Session, SessionState};
pub use stats::{ConnectionStats, StatsSnapshot};
pub use sweeper::IdleSweeper;
