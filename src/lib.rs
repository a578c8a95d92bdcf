//! # microkv - An In-Memory Key-Value Server with Per-Key TTL
//!
//! microkv is a small, single-node key-value server. Every key maps to a
//! string value with an optional expiry; a handful of commands read and
//! conditionally mutate the map over a Redis-style wire protocol.
//!
//! ## Features
//!
//! - **Conditional writes**: `SET` with NX/XX/GET/KEEPTTL and four expiry forms
//! - **Guarded expiry**: `EXPIRE` with NX/XX/GT/LT
//! - **Regex key scans**: `KEYS` takes a regular expression
//! - **Lazy + Active Expiry**: expired keys vanish on touch and on a timer
//! - **Async I/O**: Built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              microkv                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌───────────────────┐            │
//! │  │ TCP Server  │───>│ Connection  │───>│ CommandDispatcher │            │
//! │  │ (Listener)  │    │  Handler    │    │                   │            │
//! │  └─────────────┘    └──────┬──────┘    └─────────┬─────────┘            │
//! │                            │                     │                      │
//! │                            ▼                     ▼                      │
//! │                     ┌─────────────┐    ┌───────────────────┐            │
//! │                     │ FrameParser │    │ Db: Mutex<Store>  │            │
//! │                     │ Reply       │    └─────────▲─────────┘            │
//! │                     └─────────────┘              │                      │
//! │                                        ┌─────────┴─────────┐            │
//! │                                        │   ExpirySweeper   │            │
//! │                                        │ (Background Task) │            │
//! │                                        └───────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use microkv::commands::CommandDispatcher;
//! use microkv::connection::{handle_connection, ConnectionStats};
//! use microkv::storage::{Db, ExpirySweeper, Store};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     // Create the store (shared across all connections)
//!     let db = Db::new(Store::new());
//!
//!     // Start the background expiry sweeper
//!     let _sweeper = ExpirySweeper::start(db.clone());
//!
//!     let dispatcher = CommandDispatcher::new(db);
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await?;
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await?;
//!         tokio::spawn(handle_connection(
//!             stream,
//!             addr,
//!             dispatcher.clone(),
//!             Arc::clone(&stats),
//!         ));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `GET key`
//! - `SET key value [NX|XX] [GET] [EX s|PX ms|EXAT unix-s|PXAT unix-ms|KEEPTTL]`
//! - `DEL key [key ...]`
//! - `EXPIRE key seconds [NX|XX|GT|LT]`
//! - `TTL key`
//! - `KEYS pattern`
//!
//! ## Module Overview
//!
//! - [`protocol`]: Wire frame encoder and incremental decoder
//! - [`storage`]: The store, its shared handle, and the expiry sweeper
//! - [`commands`]: Command validation and dispatch
//! - [`connection`]: Client connection management
//! - [`config`]: CLI and TOML configuration
//!
//! ## Design Highlights
//!
//! ### One Lock
//!
//! The whole store sits behind a single mutex. Every command and every sweep
//! holds it for exactly one operation, so conditional commands like
//! `SET ... NX` and `EXPIRE ... GT` can't interleave with anything else.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: any command touching an expired key discards it first
//! 2. **Active**: a background task periodically removes every expired key
//!
//! This ensures memory is reclaimed even for keys that are never accessed again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandDispatcher, CommandError};
pub use config::{Config, ConfigError};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{FrameParser, ParseError, Reply, Request};
pub use storage::{Db, ExpirySweeper, Store};

/// The default port microkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host microkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default milliseconds between expired-key sweeps
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1000;

/// Version of microkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
