//! Incremental Frame Decoder
//!
//! Decodes request frames coming from clients and reply frames coming back
//! from the server. Both directions share the same framing rules, so the
//! parser is a single type with one entry point per direction.
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((value, consumed)))` - Decoded a value, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the frame is incomplete
//! - `Err(ParseError)` - Invalid protocol data
//!
//! The caller appends network data to a buffer, calls the parser, and on
//! success advances the buffer by `consumed` bytes. Nothing is copied until a
//! frame is known to be complete.
//!
//! ## Inline Requests
//!
//! A request line that does not start with a frame sigil is split on
//! whitespace and treated as a command, so the server can be driven from a
//! raw terminal. The inline line `quit` asks the server to close the
//! connection. Blank inline lines are skipped.

use crate::protocol::types::{prefix, Reply, CRLF};
use std::num::ParseIntError;
use thiserror::Error;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Invalid integer format
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Frame content is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for nil)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Protocol violation (missing CRLF, wrong element type, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The bulk string exceeds the configured maximum size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Default maximum size for a single bulk string (512 MB)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Command name followed by its arguments
    Command(Vec<String>),
    /// The raw `quit` line
    Quit,
    /// Only blank inline lines; nothing to execute
    Blank,
}

/// Frame decoder for requests and replies.
///
/// # Example
///
/// ```
/// use microkv::protocol::{FrameParser, Request};
///
/// let parser = FrameParser::new();
/// let buf = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
///
/// let (request, consumed) = parser.parse_request(buf).unwrap().unwrap();
/// assert_eq!(request, Request::Command(vec!["GET".into(), "name".into()]));
/// assert_eq!(consumed, buf.len());
/// ```
#[derive(Debug, Clone)]
pub struct FrameParser {
    max_bulk_size: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Creates a parser with the default bulk size limit.
    pub fn new() -> Self {
        Self {
            max_bulk_size: MAX_BULK_SIZE,
        }
    }

    /// Creates a parser that rejects bulk strings longer than `max` bytes.
    pub fn with_max_bulk_size(max: usize) -> Self {
        Self { max_bulk_size: max }
    }

    /// Attempts to decode one request from the buffer.
    ///
    /// Blank inline lines in front of a request are consumed as part of it.
    /// If nothing complete follows them, they come back on their own as
    /// [`Request::Blank`] so the caller can drop them from its buffer.
    pub fn parse_request(&self, buf: &[u8]) -> ParseResult<Option<(Request, usize)>> {
        let mut offset = 0;

        // Whatever blank lines were skipped so far, reported by themselves
        let skipped = |offset: usize| (offset > 0).then_some((Request::Blank, offset));

        loop {
            let rest = &buf[offset..];
            if rest.is_empty() {
                return Ok(skipped(offset));
            }

            match rest[0] {
                prefix::ARRAY => {
                    return match self.parse_string_array(rest)? {
                        Some((Some(args), consumed)) => {
                            Ok(Some((Request::Command(args), offset + consumed)))
                        }
                        Some((None, _)) => Err(ParseError::ProtocolError(
                            "request must not be a nil array".to_string(),
                        )),
                        None => Ok(skipped(offset)),
                    };
                }
                prefix::INTEGER | prefix::BULK_STRING | prefix::ERROR => {
                    return Err(ParseError::ProtocolError(
                        "request must be an array of bulk strings".to_string(),
                    ));
                }
                _ => match parse_inline(rest)? {
                    None => return Ok(skipped(offset)),
                    Some((None, consumed)) => offset += consumed,
                    Some((Some(request), consumed)) => {
                        return Ok(Some((request, offset + consumed)))
                    }
                },
            }
        }
    }

    /// Attempts to decode one reply from the buffer.
    pub fn parse_reply(&self, buf: &[u8]) -> ParseResult<Option<(Reply, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        match buf[0] {
            prefix::INTEGER => {
                let Some(pos) = find_crlf(&buf[1..]) else {
                    return Ok(None);
                };
                let n = parse_integer(&buf[1..1 + pos])?;
                Ok(Some((Reply::Integer(n), 1 + pos + 2)))
            }
            prefix::ERROR => {
                let Some(pos) = find_crlf(&buf[1..]) else {
                    return Ok(None);
                };
                let s = to_string(&buf[1..1 + pos])?;
                Ok(Some((Reply::Error(s), 1 + pos + 2)))
            }
            prefix::BULK_STRING => Ok(self.parse_bulk(buf)?.map(|(value, consumed)| {
                let reply = match value {
                    Some(s) => Reply::Bulk(s),
                    None => Reply::Nil,
                };
                (reply, consumed)
            })),
            prefix::ARRAY => Ok(self.parse_string_array(buf)?.map(|(items, consumed)| {
                let reply = match items {
                    Some(items) => Reply::Array(items),
                    None => Reply::Nil,
                };
                (reply, consumed)
            })),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`, or `$-1\r\n` for nil.
    fn parse_bulk(&self, buf: &[u8]) -> ParseResult<Option<(Option<String>, usize)>> {
        debug_assert!(buf[0] == prefix::BULK_STRING);

        let length_end = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let length = parse_integer(&buf[1..1 + length_end])?;

        if length == -1 {
            return Ok(Some((None, 1 + length_end + 2)));
        }

        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > self.max_bulk_size {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: self.max_bulk_size,
            });
        }

        let data_start = 1 + length_end + 2;
        let total_needed = data_start + length + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[data_start + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let s = to_string(&buf[data_start..data_start + length])?;
        Ok(Some((Some(s), total_needed)))
    }

    /// Parses `*<count>\r\n` followed by `count` non-nil bulk strings.
    /// `*-1\r\n` yields `None`.
    fn parse_string_array(
        &self,
        buf: &[u8],
    ) -> ParseResult<Option<(Option<Vec<String>>, usize)>> {
        debug_assert!(buf[0] == prefix::ARRAY);

        let count_end = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let count = parse_integer(&buf[1..1 + count_end])?;
        if count == -1 {
            return Ok(Some((None, 1 + count_end + 2)));
        }
        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        // The count is untrusted, so don't let it size the allocation alone.
        let mut items = Vec::with_capacity(count.min(64));
        let mut consumed = 1 + count_end + 2;

        for _ in 0..count {
            let rest = &buf[consumed..];
            if rest.is_empty() {
                return Ok(None);
            }
            if rest[0] != prefix::BULK_STRING {
                return Err(ParseError::ProtocolError(
                    "array elements must be bulk strings".to_string(),
                ));
            }

            match self.parse_bulk(rest)? {
                Some((Some(item), n)) => {
                    items.push(item);
                    consumed += n;
                }
                Some((None, _)) => {
                    return Err(ParseError::ProtocolError(
                        "array elements must not be nil".to_string(),
                    ));
                }
                None => return Ok(None),
            }
        }

        Ok(Some((Some(items), consumed)))
    }
}

/// Parses one inline line. `Some((None, n))` is a blank line of `n` bytes.
fn parse_inline(buf: &[u8]) -> ParseResult<Option<(Option<Request>, usize)>> {
    let lf = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let line = match buf[..lf].last() {
        Some(b'\r') => &buf[..lf - 1],
        _ => &buf[..lf],
    };
    let line = std::str::from_utf8(line).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    let consumed = lf + 1;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Some((None, consumed)));
    }
    if trimmed == "quit" {
        return Ok(Some((Some(Request::Quit), consumed)));
    }

    let args = trimmed.split_whitespace().map(str::to_string).collect();
    Ok(Some((Some(Request::Command(args)), consumed)))
}

fn parse_integer(bytes: &[u8]) -> ParseResult<i64> {
    let s = std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    s.parse()
        .map_err(|e: ParseIntError| ParseError::InvalidInteger(format!("{:?}: {}", s, e)))
}

fn to_string(bytes: &[u8]) -> ParseResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Decodes a single request from bytes.
pub fn decode_request(buf: &[u8]) -> ParseResult<Option<(Request, usize)>> {
    FrameParser::new().parse_request(buf)
}

/// Decodes a single reply from bytes.
pub fn decode_reply(buf: &[u8]) -> ParseResult<Option<(Reply, usize)>> {
    FrameParser::new().parse_reply(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::encode_command;

    fn command(args: &[&str]) -> Request {
        Request::Command(args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_array_request() {
        let input = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
        let (request, consumed) = decode_request(input).unwrap().unwrap();
        assert_eq!(request, command(&["GET", "name"]));
        assert_eq!(consumed, 23);
    }

    #[test]
    fn test_parse_set_request() {
        let input = b"*5\r\n$3\r\nSET\r\n$7\r\nsession\r\n$3\r\nabc\r\n$2\r\nEX\r\n$2\r\n60\r\n";
        let (request, _) = decode_request(input).unwrap().unwrap();
        assert_eq!(request, command(&["SET", "session", "abc", "EX", "60"]));
    }

    #[test]
    fn test_parse_request_incomplete() {
        assert!(decode_request(b"*2\r\n$3\r\nGET\r\n").unwrap().is_none());
        assert!(decode_request(b"*2\r\n$3\r\nGET\r\n$4\r\nna").unwrap().is_none());
        assert!(decode_request(b"*2").unwrap().is_none());
        assert!(decode_request(b"").unwrap().is_none());
    }

    #[test]
    fn test_parse_two_requests_in_one_buffer() {
        let mut buf = encode_command(&["GET", "a"]);
        buf.extend_from_slice(&encode_command(&["GET", "b"]));

        let (first, consumed) = decode_request(&buf).unwrap().unwrap();
        assert_eq!(first, command(&["GET", "a"]));
        let (second, _) = decode_request(&buf[consumed..]).unwrap().unwrap();
        assert_eq!(second, command(&["GET", "b"]));
    }

    #[test]
    fn test_parse_empty_array_request() {
        let (request, _) = decode_request(b"*0\r\n").unwrap().unwrap();
        assert_eq!(request, Request::Command(vec![]));
    }

    #[test]
    fn test_parse_inline_request() {
        let (request, consumed) = decode_request(b"SET k v\r\n").unwrap().unwrap();
        assert_eq!(request, command(&["SET", "k", "v"]));
        assert_eq!(consumed, 9);

        let (request, consumed) = decode_request(b"TTL k\n").unwrap().unwrap();
        assert_eq!(request, command(&["TTL", "k"]));
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_parse_quit_line() {
        let (request, consumed) = decode_request(b"quit\n").unwrap().unwrap();
        assert_eq!(request, Request::Quit);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (request, consumed) = decode_request(b"\r\n\n  \nGET k\r\n").unwrap().unwrap();
        assert_eq!(request, command(&["GET", "k"]));
        assert_eq!(consumed, 13);
    }

    #[test]
    fn test_blank_lines_alone_are_consumed() {
        assert_eq!(
            decode_request(b"\r\n").unwrap(),
            Some((Request::Blank, 2))
        );
        assert_eq!(
            decode_request(b"\n\n\n").unwrap(),
            Some((Request::Blank, 3))
        );

        // Blank lines ahead of an incomplete request still get released
        assert_eq!(
            decode_request(b"\n\nGET k").unwrap(),
            Some((Request::Blank, 2))
        );
        assert_eq!(
            decode_request(b"\r\n*2\r\n$3\r\nGET\r\n").unwrap(),
            Some((Request::Blank, 2))
        );

        // Nothing buffered, or a partial line with no blanks in front
        assert_eq!(decode_request(b"").unwrap(), None);
        assert_eq!(decode_request(b"GET k").unwrap(), None);
    }

    #[test]
    fn test_request_must_be_array() {
        assert!(matches!(
            decode_request(b":1\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
        assert!(matches!(
            decode_request(b"$3\r\nGET\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
        assert!(matches!(
            decode_request(b"*-1\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_request_elements_must_be_bulk() {
        assert!(matches!(
            decode_request(b"*1\r\n:1\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
        assert!(matches!(
            decode_request(b"*1\r\n$-1\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(matches!(
            decode_request(b"*x\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
        assert!(matches!(
            decode_request(b"*-3\r\n"),
            Err(ParseError::InvalidArrayLength(-3))
        ));
        assert!(matches!(
            decode_request(b"*1\r\n$-5\r\n"),
            Err(ParseError::InvalidBulkLength(-5))
        ));
    }

    #[test]
    fn test_bulk_missing_trailing_crlf() {
        assert!(matches!(
            decode_request(b"*1\r\n$3\r\nGETxx"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_bulk_size_limit() {
        let parser = FrameParser::with_max_bulk_size(4);
        assert!(matches!(
            parser.parse_request(b"*1\r\n$5\r\nhello\r\n"),
            Err(ParseError::MessageTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(matches!(
            decode_request(b"*1\r\n$2\r\n\xff\xfe\r\n"),
            Err(ParseError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_parse_reply_kinds() {
        assert_eq!(
            decode_reply(b":-2\r\n").unwrap().unwrap(),
            (Reply::Integer(-2), 5)
        );
        assert_eq!(
            decode_reply(b"$5\r\nhello\r\n").unwrap().unwrap(),
            (Reply::bulk("hello"), 11)
        );
        assert_eq!(decode_reply(b"$-1\r\n").unwrap().unwrap(), (Reply::Nil, 5));
        assert_eq!(
            decode_reply(b"-ERR boom\r\n").unwrap().unwrap(),
            (Reply::error("ERR boom"), 11)
        );
    }

    #[test]
    fn test_parse_reply_unknown_prefix() {
        assert!(matches!(
            decode_reply(b"+OK\r\n"),
            Err(ParseError::UnknownPrefix(b'+'))
        ));
    }

    #[test]
    fn test_reply_roundtrip() {
        let replies = vec![
            Reply::integer(0),
            Reply::integer(-1),
            Reply::integer(i64::MAX),
            Reply::bulk("hello world"),
            Reply::bulk(""),
            Reply::ok(),
            Reply::nil(),
            Reply::array(["apple", "avocado"]),
            Reply::array(Vec::<String>::new()),
            Reply::error("ERR invalid pattern"),
        ];

        for reply in replies {
            let bytes = reply.serialize();
            let (decoded, consumed) = decode_reply(&bytes).unwrap().unwrap();
            assert_eq!(decoded, reply);
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn test_command_roundtrip() {
        let args = ["SET", "greeting", "hello world", "PX", "1500"];
        let bytes = encode_command(&args);
        let (request, consumed) = decode_request(&bytes).unwrap().unwrap();
        assert_eq!(request, command(&args));
        assert_eq!(consumed, bytes.len());
    }
}
