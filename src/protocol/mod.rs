//! Wire Codec
//!
//! This module encodes command results into wire frames and decodes frames
//! coming off a socket.
//!
//! ## Modules
//!
//! - `types`: Defines the `Reply` enum and its serialization
//! - `parser`: Incremental decoder for requests and replies
//!
//! ## Example
//!
//! ```
//! use microkv::protocol::{decode_request, Reply, Request};
//!
//! // Decoding an incoming request
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (request, consumed) = decode_request(data).unwrap().unwrap();
//! assert_eq!(request, Request::Command(vec!["GET".into(), "name".into()]));
//! assert_eq!(consumed, data.len());
//!
//! // Encoding a response
//! let bytes = Reply::bulk("Ariz").serialize();
//! assert_eq!(bytes, b"$4\r\nAriz\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{decode_reply, decode_request, FrameParser, ParseError, ParseResult, Request};
pub use types::{encode_command, Reply};
