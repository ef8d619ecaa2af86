//! Live-update feed client for the Forgeboard dashboard.
//!
//! This crate intentionally exposes a small surface:
//! - typed status frames parsed at the wire boundary
//! - independent handler dispatch per field group
//! - bounded, linear-backoff reconnection

pub mod client;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod reconnect;

pub use client::{ConnectionState, FeedConfig, LiveUpdateClient, StateObserver, feed_url};
pub use dispatch::{UpdateHandler, dispatch};
pub use error::{FeedError, Result};
pub use message::{ActivityUpdate, LogUpdate, StatsUpdate, StatusUpdate, parse_update};
pub use reconnect::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, ReconnectPolicy};
