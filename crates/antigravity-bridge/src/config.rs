//! Bridge configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the directory holding messages received from Telegram.
pub const INBOX_DIR: &str = "inbox";

/// Name of the directory holding replies waiting to be sent.
pub const OUTBOX_DIR: &str = "outbox";

/// Name of the file recording the chat replies go to.
pub const RECIPIENT_FILE: &str = "chat_id";

/// Configuration for the bridge queue and poller.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Root of the queue.
    pub root: PathBuf,
    /// How often the outbox is scanned.
    pub poll_interval: Duration,
}

impl BridgeConfig {
    /// Creates a config rooted at `root` with a 2s poll interval.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join(INBOX_DIR)
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.root.join(OUTBOX_DIR)
    }

    pub fn recipient_file(&self) -> PathBuf {
        self.root.join(RECIPIENT_FILE)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
