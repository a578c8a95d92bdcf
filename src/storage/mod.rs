//! Storage Module
//!
//! This module provides the core storage functionality for microkv: a
//! key-value store with per-key expiry, the shared handle every connection
//! locks, and the background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ ┌───────────┐ ┌───────────┐
//! │ conn task │ │ conn task │ │ conn task │
//! └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!       └─────────────┼─────────────┘
//!                     ▼
//!        ┌─────────────────────────┐
//!        │  Db: Arc<Mutex<Store>>  │◄──── ExpirySweeper
//!        └─────────────────────────┘      (Background Tokio Task)
//! ```
//!
//! ## Features
//!
//! - **One lock**: each command runs atomically against every other command
//! - **TTL Support**: keys can carry an expiry instant
//! - **Lazy Expiry**: expired keys are discarded when touched
//! - **Active Expiry**: the sweeper removes expired keys nobody touches
//!
//! ## Example
//!
//! ```
//! use microkv::storage::{Db, SetOptions, Store};
//! use std::time::{Duration, Instant};
//!
//! let db = Db::new(Store::new());
//!
//! db.lock().set("name".into(), "Ariz".into(), SetOptions::default());
//! assert_eq!(db.lock().get("name"), Some("Ariz".to_string()));
//!
//! // Set with TTL
//! db.lock().set(
//!     "session".into(),
//!     "token123".into(),
//!     SetOptions {
//!         expires_at: Some(Instant::now() + Duration::from_secs(3600)),
//!         ..Default::default()
//!     },
//! );
//! assert!(db.lock().ttl("session") > 3500);
//! ```

pub mod db;
pub mod expiry;
pub mod store;

// Re-export commonly used types
pub use db::Db;
pub use expiry::ExpirySweeper;
pub use store::{
    deadline_after, deadline_after_millis, Entry, ExpireOptions, PatternError, SetOptions,
    SetOutcome, Store, DEFAULT_SWEEP_INTERVAL,
};
