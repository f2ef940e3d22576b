//! Wire Protocol
//!
//! This module covers everything about how requests and responses look on
//! the wire.
//!
//! ## Overview
//!
//! Both transports carry one textual message per request and one per
//! response. A request is a verb plus whitespace-separated arguments. The
//! datagram transport needs nothing more: one packet is one message. The
//! stream transport wraps every message in a 2-byte length-prefixed frame.
//!
//! ## Modules
//!
//! - `command`: Decodes request text into a typed `Command`
//! - `frame`: Length-prefixed framing for the stream transport
//!
//! ## Example
//!
//! ```
//! use duokv::protocol::{encode_frame, parse_frame, Command};
//!
//! let bytes = encode_frame("DELETE name").unwrap();
//! let (text, _consumed) = parse_frame(&bytes).unwrap().unwrap();
//! assert_eq!(Command::parse(&text), Command::Delete { key: "name".into() });
//! ```

pub mod command;
pub mod frame;

// Re-export commonly used types for convenience
pub use command::{tokenize, Command, Verb};
pub use frame::{encode_frame, parse_frame, FrameError, FrameResult, MAX_FRAME_LEN};
