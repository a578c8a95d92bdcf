//! Wire Reply Types
//!
//! Every result a command can produce is one of five wire-representable
//! kinds. Each kind starts with a one-byte sigil and ends with CRLF:
//!
//! - `:` Integer
//! - `$` Bulk string (`$-1` is nil)
//! - `*` Array of bulk strings
//! - `-` Error
//!
//! ## Examples
//!
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Nil: `$-1\r\n`
//! Array: `*2\r\n$5\r\napple\r\n$7\r\navocado\r\n`
//! Error: `-ERR unknown command 'FOO'\r\n`

use std::fmt;

/// The CRLF terminator used by every frame
pub const CRLF: &[u8] = b"\r\n";

/// Frame type sigils
pub mod prefix {
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A typed command result, encoded exhaustively by [`Reply::serialize_into`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 64-bit signed integer.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// A UTF-8 string framed by its byte length.
    /// Format: `$<length>\r\n<data>\r\n`
    Bulk(String),

    /// The absent value.
    /// Format: `$-1\r\n`
    Nil,

    /// A flat list of strings.
    /// Format: `*<count>\r\n` followed by `count` bulk strings
    Array(Vec<String>),

    /// A request-level failure. CR and LF in the message are written as
    /// spaces, so the frame is always one line.
    /// Format: `-<message>\r\n`
    Error(String),
}

impl Reply {
    /// Creates an integer reply.
    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates a bulk string reply.
    ///
    /// # Example
    /// ```
    /// use microkv::protocol::Reply;
    /// let bulk = Reply::bulk("hello");
    /// assert_eq!(bulk.serialize(), b"$5\r\nhello\r\n");
    /// ```
    pub fn bulk(s: impl Into<String>) -> Self {
        Reply::Bulk(s.into())
    }

    /// Creates the nil reply.
    pub fn nil() -> Self {
        Reply::Nil
    }

    /// Creates an array reply from anything yielding strings.
    pub fn array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Reply::Array(items.into_iter().map(Into::into).collect())
    }

    /// Creates an error reply. Line breaks in the message are flattened to
    /// spaces when the reply is serialized.
    ///
    /// # Example
    /// ```
    /// use microkv::protocol::Reply;
    /// let err = Reply::error("ERR bad\r\nthing");
    /// assert_eq!(err.serialize(), b"-ERR bad  thing\r\n");
    /// ```
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    /// The acknowledgement for a successful SET.
    pub fn ok() -> Self {
        Reply::Bulk("OK".to_string())
    }

    /// Wraps an optional value as bulk or nil.
    pub fn from_option(value: Option<String>) -> Self {
        match value {
            Some(v) => Reply::Bulk(v),
            None => Reply::Nil,
        }
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(s) => write_bulk(buf, s),
            Reply::Nil => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Array(items) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for item in items {
                    write_bulk(buf, item);
                }
            }
            Reply::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend(s.bytes().map(|b| match b {
                    b'\r' | b'\n' => b' ',
                    b => b,
                }));
                buf.extend_from_slice(CRLF);
            }
        }
    }

    /// Returns true if this reply is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Returns true if this reply is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Returns the inner integer, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Encodes a request the way a client sends it: an array of bulk strings.
pub fn encode_command<S: AsRef<str>>(args: &[S]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(prefix::ARRAY);
    buf.extend_from_slice(args.len().to_string().as_bytes());
    buf.extend_from_slice(CRLF);
    for arg in args {
        write_bulk(&mut buf, arg.as_ref());
    }
    buf
}

fn write_bulk(buf: &mut Vec<u8>, s: &str) {
    buf.push(prefix::BULK_STRING);
    buf.extend_from_slice(s.len().to_string().as_bytes());
    buf.extend_from_slice(CRLF);
    buf.extend_from_slice(s.as_bytes());
    buf.extend_from_slice(CRLF);
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(s) => write!(f, "\"{}\"", s),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Array(items) => {
                if items.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            writeln!(f)?;
                        }
                        write!(f, "{}) \"{}\"", i + 1, item)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_serialize() {
        assert_eq!(Reply::integer(1000).serialize(), b":1000\r\n");
        assert_eq!(Reply::integer(-2).serialize(), b":-2\r\n");
    }

    #[test]
    fn test_bulk_serialize() {
        assert_eq!(Reply::bulk("hello").serialize(), b"$5\r\nhello\r\n");
        assert_eq!(Reply::bulk("").serialize(), b"$0\r\n\r\n");
    }

    #[test]
    fn test_bulk_length_counts_bytes() {
        // "é" is two bytes in UTF-8
        assert_eq!(Reply::bulk("é").serialize(), "$2\r\né\r\n".as_bytes());
    }

    #[test]
    fn test_nil_serialize() {
        assert_eq!(Reply::nil().serialize(), b"$-1\r\n");
    }

    #[test]
    fn test_array_serialize() {
        let value = Reply::array(["apple", "avocado"]);
        assert_eq!(
            value.serialize(),
            b"*2\r\n$5\r\napple\r\n$7\r\navocado\r\n"
        );
        assert_eq!(Reply::array(Vec::<String>::new()).serialize(), b"*0\r\n");
    }

    #[test]
    fn test_error_serialize() {
        let value = Reply::error("ERR unknown command 'FOO'");
        assert_eq!(value.serialize(), b"-ERR unknown command 'FOO'\r\n");
    }

    #[test]
    fn test_error_flattens_line_breaks() {
        assert_eq!(Reply::error("a\nb").serialize(), b"-a b\r\n");

        // Built directly, bypassing the constructor
        let raw = Reply::Error("ERR x\r\n+OK".to_string());
        assert_eq!(raw.serialize(), b"-ERR x  +OK\r\n");
    }

    #[test]
    fn test_ok_is_bulk() {
        assert_eq!(Reply::ok().serialize(), b"$2\r\nOK\r\n");
    }

    #[test]
    fn test_encode_command() {
        assert_eq!(
            encode_command(&["GET", "name"]),
            b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Reply::integer(3).to_string(), "(integer) 3");
        assert_eq!(Reply::nil().to_string(), "(nil)");
        assert_eq!(Reply::array(["a", "b"]).to_string(), "1) \"a\"\n2) \"b\"");
    }
}
