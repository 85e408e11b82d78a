//! File-queue bridge for the Antigravity bot.
//!
//! In bridge mode the bot does not answer by itself. Each inbound message is
//! written to `inbox/` for another process (a human, an IDE agent) to pick
//! up, and whatever that process drops into `outbox/` is relayed back to the
//! last chat that wrote to the bot.
//!
//! - [`BridgeQueue`] reads and writes the queue directories and the
//!   recipient record
//! - [`BridgePoller`] is the background task that drains the outbox
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use antigravity_bridge::{BridgeConfig, BridgePoller, BridgeQueue};
//! use tokio::sync::watch;
//!
//! let queue = BridgeQueue::new(BridgeConfig::new("/var/lib/antigravity/bridge"));
//! queue.ensure_dirs()?;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let mut poller = BridgePoller::new(queue.clone(), channel, shutdown_rx);
//! tokio::spawn(async move { poller.run().await });
//!
//! // later
//! shutdown_tx.send(true)?;
//! ```

pub mod config;
pub mod error;
pub mod poller;
pub mod queue;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use poller::{BridgePoller, PollReport};
pub use queue::{BridgeQueue, InboxRecord, OutboxRecord};
