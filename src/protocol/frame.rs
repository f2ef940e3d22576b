//! Length-Prefixed Stream Framing
//!
//! TCP is a byte stream, so each request and response on the stream transport
//! is wrapped in a frame that marks where it ends:
//!
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ length (u16) │ payload (length bytes)      │
//! │  big-endian  │ UTF-8 text                  │
//! └──────────────┴─────────────────────────────┘
//! ```
//!
//! A frame carries at most 65535 payload bytes.
//!
//! ## How the Parser Works
//!
//! Like any incremental parser, [`parse_frame`] reads from a buffer and
//! returns either:
//! - `Ok(Some((text, consumed)))` - a whole frame was decoded
//! - `Ok(None)` - the frame is incomplete, read more bytes first
//! - `Err(FrameError)` - the payload is not valid UTF-8

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Largest payload a frame can carry.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Errors that can occur while framing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    /// The payload is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// The payload does not fit in a u16 length prefix
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Result type for framing operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Attempts to decode one frame from the front of `buf`.
///
/// # Example
///
/// ```
/// use duokv::protocol::frame::parse_frame;
///
/// let buf = b"\x00\x04KEYS\x00\x04QUIT";
/// let (text, consumed) = parse_frame(buf).unwrap().unwrap();
/// assert_eq!(text, "KEYS");
/// assert_eq!(consumed, 6);
///
/// assert_eq!(parse_frame(b"\x00\x04KE").unwrap(), None);
/// ```
pub fn parse_frame(buf: &[u8]) -> FrameResult<Option<(String, usize)>> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Ok(None);
    }

    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    let end = LENGTH_PREFIX_LEN + len;
    if buf.len() < end {
        return Ok(None);
    }

    let text = std::str::from_utf8(&buf[LENGTH_PREFIX_LEN..end])
        .map_err(|e| FrameError::InvalidUtf8(e.to_string()))?;

    Ok(Some((text.to_string(), end)))
}

/// Encodes `text` as one frame.
pub fn encode_frame(text: &str) -> FrameResult<Bytes> {
    let payload = text.as_bytes();
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let frame = encode_frame("GET key").unwrap();
        assert_eq!(&frame[..], b"\x00\x07GET key");

        let empty = encode_frame("").unwrap();
        assert_eq!(&empty[..], b"\x00\x00");
    }

    #[test]
    fn test_parse_incomplete() {
        assert_eq!(parse_frame(b"").unwrap(), None);
        assert_eq!(parse_frame(b"\x00").unwrap(), None);
        assert_eq!(parse_frame(b"\x00\x07GET").unwrap(), None);
    }

    #[test]
    fn test_parse_pipelined() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_frame("PUT a 1").unwrap());
        buf.extend_from_slice(&encode_frame("GET a").unwrap());

        let (first, consumed) = parse_frame(&buf).unwrap().unwrap();
        assert_eq!(first, "PUT a 1");
        let _ = buf.split_to(consumed);

        let (second, consumed) = parse_frame(&buf).unwrap().unwrap();
        assert_eq!(second, "GET a");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let result = parse_frame(b"\x00\x02\xff\xfe");
        assert!(matches!(result, Err(FrameError::InvalidUtf8(_))));
    }

    #[test]
    fn test_frame_too_large() {
        let text = "x".repeat(MAX_FRAME_LEN + 1);
        assert_eq!(
            encode_frame(&text),
            Err(FrameError::FrameTooLarge {
                size: MAX_FRAME_LEN + 1,
                max: MAX_FRAME_LEN
            })
        );
        assert!(encode_frame(&text[..MAX_FRAME_LEN]).is_ok());
    }

    #[test]
    fn test_multibyte_payload_length_is_bytes() {
        let frame = encode_frame("é").unwrap();
        assert_eq!(&frame[..2], &[0, 2]);
        assert_eq!(parse_frame(&frame).unwrap(), Some(("é".to_string(), 4)));
    }
}
