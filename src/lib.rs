//! # DuoKV - A Toy In-Memory Key-Value Store over TCP and UDP
//!
//! DuoKV keeps short string keys and values in memory and serves them over two
//! transports at once: a length-prefixed TCP stream and plain UDP datagrams.
//! Every request is one line of text, every response is one human-readable
//! message.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               DuoKV                                     │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐                                    │
//! │  │ StreamServer │──>│ Connection   │──┐                                 │
//! │  │ (TCP :8080)  │   │ Handler      │  │   ┌──────────────┐              │
//! │  └──────────────┘   │ + Session    │  ├──>│ Command      │              │
//! │                     └──────────────┘  │   │ Handler      │              │
//! │  ┌──────────────┐   ┌──────────────┐  │   └──────┬───────┘              │
//! │  │DatagramServer│──>│ worker pool  │──┘          │                      │
//! │  │ (UDP :8081)  │   │ (Semaphore)  │             ▼                      │
//! │  └──────────────┘   └──────────────┘   ┌──────────────────────┐         │
//! │                                        │ StoreRegistry        │         │
//! │                                        │ per-client | shared  │         │
//! │                                        │  └─> SharedStore     │         │
//! │                                        │      (Mutex<Store>)  │         │
//! │                                        └──────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use duokv::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::bind(&Config::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Commands
//!
//! - `PUT key value` - insert a new pair; keys are letters and digits, both
//!   fields at most 10 characters, existing keys are never overwritten
//! - `GET key`
//! - `DELETE key`
//! - `KEYS` - all keys joined with `:`
//! - `STATISTICS` (or `STAT`) - per-session command counts, stream only
//! - `QUIT` - acknowledge and end the session
//!
//! Unknown verbs produce no response at all.
//!
//! ## Module Overview
//!
//! - [`protocol`]: request tokenizing and stream framing
//! - [`storage`]: the store and its lock-protected handle
//! - [`commands`]: command execution and the per-session command log
//! - [`connection`]: both transports and client-to-store binding
//! - [`server`]: both transports behind one handle
//! - [`client`]: validating request/response clients
//! - [`config`]: command-line configuration

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use client::{ClientError, DatagramClient, StreamClient};
pub use commands::{CommandHandler, CommandLog, Response};
pub use config::{Config, StatisticsPolicy, StoreScope};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, Verb};
pub use server::{Server, ServerError};
pub use storage::{SharedStore, Store};

/// Version of DuoKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
