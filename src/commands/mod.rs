//! Command Module
//!
//! This module implements the command processing layer for microkv.
//! It receives decoded requests, executes them against the store,
//! and returns replies for the codec to encode.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌───────────────────┐
//! │  Frame Parser     │  (protocol module)
//! └────────┬──────────┘
//!          │
//!          ▼
//! ┌───────────────────┐
//! │ CommandDispatcher │  (this module)
//! │                   │
//! │  - Dispatch       │
//! │  - Validate       │
//! │  - Execute        │
//! └────────┬──────────┘
//!          │
//!          ▼
//! ┌───────────────────┐
//! │ Db / Store        │  (storage module)
//! └───────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `GET`, `SET`, `DEL`
//! - `EXPIRE`, `TTL`, `KEYS`

pub mod error;
pub mod handler;

pub use error::CommandError;
pub use handler::CommandDispatcher;
