//! Filesystem-backed message queue shared with the relay process.
//!
//! Layout under the bridge root:
//!
//! ```text
//! inbox/{millis}.json   messages received from Telegram
//! outbox/*              plain-text replies waiting to be sent
//! chat_id               chat the replies go to
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use antigravity_core::InboundMessage;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};

/// A message as written to the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxRecord {
    pub from: String,
    pub text: String,
    /// RFC 3339 arrival time.
    pub timestamp: String,
    pub chat_id: i64,
}

impl From<&InboundMessage> for InboxRecord {
    fn from(msg: &InboundMessage) -> Self {
        Self {
            from: msg.from.clone(),
            text: msg.text.clone(),
            timestamp: msg.received_at.to_rfc3339(),
            chat_id: msg.chat_id,
        }
    }
}

/// A reply file waiting in the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub path: PathBuf,
    /// Millisecond timestamp parsed from the file stem, if it is one.
    pub created_ms: Option<u64>,
}

impl OutboxRecord {
    fn new(path: PathBuf) -> Self {
        let created_ms = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok());
        Self { path, created_ms }
    }

    fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Read the record's text. Invalid UTF-8 sequences are replaced.
    pub fn read(&self) -> Result<String> {
        let bytes = fs::read(&self.path).map_err(|source| BridgeError::Read {
            path: self.path.clone(),
            source,
        })?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(path = %self.path.display(), "Outbox record is not valid UTF-8");
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }

    /// Remove the record from the outbox.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BridgeError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Handle on the bridge directory.
#[derive(Debug, Clone)]
pub struct BridgeQueue {
    config: BridgeConfig,
}

impl BridgeQueue {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Create the inbox and outbox directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.config.inbox_dir(), self.config.outbox_dir()] {
            fs::create_dir_all(&dir).map_err(|source| BridgeError::Directory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Persist an inbound message as `inbox/{millis}.json`.
    ///
    /// If a record already exists for that millisecond the next free one is
    /// used, so names stay numeric and ordered.
    pub fn enqueue_inbound(&self, msg: &InboundMessage) -> Result<PathBuf> {
        let inbox = self.config.inbox_dir();
        let record = InboxRecord::from(msg);
        let json = serde_json::to_string_pretty(&record)?;

        let mut millis = msg.received_at.timestamp_millis().max(0);
        let path = loop {
            let candidate = inbox.join(format!("{millis}.json"));
            if !candidate.exists() {
                break candidate;
            }
            millis += 1;
        };

        atomic_write(&path, json.as_bytes())?;
        debug!(path = %path.display(), chat_id = msg.chat_id, "Inbound message queued");
        Ok(path)
    }

    /// Record the chat that outbox replies go to. Last writer wins.
    pub fn set_recipient(&self, chat_id: i64) -> Result<()> {
        atomic_write(&self.config.recipient_file(), chat_id.to_string().as_bytes())
    }

    /// The chat outbox replies go to, if one was recorded.
    pub fn recipient(&self) -> Result<Option<i64>> {
        let path = self.config.recipient_file();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BridgeError::Read { path, source }),
        };

        let value = raw.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| BridgeError::InvalidRecipient {
                path,
                value: value.to_string(),
            })
    }

    /// Pending outbox records, oldest first.
    ///
    /// Records with a numeric stem sort by that timestamp and come before
    /// any others, which sort by file name. Dotfiles and directories are
    /// skipped.
    pub fn pending(&self) -> Result<Vec<OutboxRecord>> {
        let dir = self.config.outbox_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(BridgeError::Directory { path: dir, source }),
        };

        let mut records: Vec<OutboxRecord> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| OutboxRecord::new(entry.path()))
            .filter(|record| !record.file_name().starts_with('.'))
            .collect();

        records.sort_by(|a, b| match (a.created_ms, b.created_ms) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.file_name().cmp(b.file_name())),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.file_name().cmp(b.file_name()),
        });
        Ok(records)
    }
}

/// Write `data` to `path` through a temporary file in the same directory.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|source| BridgeError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let write_err = |source: std::io::Error| BridgeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp_file.write_all(data).map_err(write_err)?;
    temp_file.flush().map_err(write_err)?;
    temp_file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
