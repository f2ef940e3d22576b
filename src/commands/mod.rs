//! Command Processing Module
//!
//! This module implements the command layer shared by both transports.
//! It receives parsed commands, executes them against a store, and returns
//! the response the transport should send.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Command Parser  │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌─────────────────┐
//! │ CommandHandler  │─────>│   CommandLog    │  (per session)
//! │  (this module)  │      └─────────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  SharedStore    │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PUT key value`, `GET key`, `DELETE key`, `KEYS`
//! - `STATISTICS` (stream sessions only)
//! - `QUIT`

pub mod handler;
pub mod stats;

// Re-export the main command types
pub use handler::{CommandHandler, Response, DISCONNECT_MESSAGE, OVERSIZED_REPLY_MESSAGE};
pub use stats::{CommandLog, REPORTED_VERBS, REPORT_HEADER};
