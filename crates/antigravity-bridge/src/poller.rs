//! Outbox poller relaying queued replies to the recipient chat.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, trace, warn};

use antigravity_core::{deliver_chunked, Channel};

use crate::error::Result;
use crate::queue::{BridgeQueue, OutboxRecord};

/// Summary of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Records sent and removed.
    pub delivered: usize,
    /// Blank records removed without sending.
    pub discarded: usize,
    /// Records left for the next cycle.
    pub failed: usize,
}

/// Polls the outbox and delivers each record to the recorded chat.
pub struct BridgePoller<C: Channel + ?Sized> {
    queue: BridgeQueue,
    channel: Arc<C>,
    shutdown: watch::Receiver<bool>,
}

impl<C: Channel + ?Sized> BridgePoller<C> {
    /// Creates a new poller.
    pub fn new(queue: BridgeQueue, channel: Arc<C>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            queue,
            channel,
            shutdown,
        }
    }

    /// Run the polling loop until the shutdown signal is set.
    pub async fn run(&mut self) {
        let poll_interval = self.queue.config().poll_interval;
        let mut ticker = interval(poll_interval);

        info!(
            outbox = %self.queue.config().outbox_dir().display(),
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Starting bridge poller"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(report) if report != PollReport::default() => {
                            debug!(?report, "Bridge poll cycle finished");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Bridge poll cycle failed"),
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!("Bridge poller received shutdown signal");
                        break;
                    }
                }
            }
        }

        info!("Bridge poller stopped");
    }

    /// Deliver every pending record once.
    ///
    /// Does nothing while no recipient is recorded. A record is removed
    /// only after all of its chunks were sent; blank records are removed
    /// without sending.
    pub async fn poll_once(&self) -> Result<PollReport> {
        let mut report = PollReport::default();

        let Some(chat_id) = self.queue.recipient()? else {
            trace!("No recipient recorded yet, skipping cycle");
            return Ok(report);
        };

        for record in self.queue.pending()? {
            match self.deliver(chat_id, &record).await {
                Ok(true) => report.delivered += 1,
                Ok(false) => report.discarded += 1,
                Err(e) => {
                    warn!(
                        path = %record.path.display(),
                        error = %e,
                        "Failed to deliver outbox record"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Returns whether anything was sent.
    async fn deliver(&self, chat_id: i64, record: &OutboxRecord) -> Result<bool> {
        let text = record.read()?;

        if text.trim().is_empty() {
            record.remove()?;
            debug!(path = %record.path.display(), "Discarded blank outbox record");
            return Ok(false);
        }

        let chunks = deliver_chunked(self.channel.as_ref(), chat_id, &text).await?;
        record.remove()?;
        info!(
            chat_id,
            path = %record.path.display(),
            chunks,
            "Outbox record delivered"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use antigravity_core::channel::recording::RecordingChannel;
    use antigravity_core::TextFormat;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup(channel: RecordingChannel) -> (TempDir, BridgeQueue, Arc<RecordingChannel>) {
        let dir = TempDir::new().unwrap();
        let queue = BridgeQueue::new(
            BridgeConfig::new(dir.path()).with_poll_interval(Duration::from_millis(10)),
        );
        queue.ensure_dirs().unwrap();
        (dir, queue, Arc::new(channel))
    }

    fn write_outbox(queue: &BridgeQueue, name: &str, content: &str) {
        fs::write(queue.config().outbox_dir().join(name), content).unwrap();
    }

    fn poller(
        queue: &BridgeQueue,
        channel: &Arc<RecordingChannel>,
    ) -> (BridgePoller<RecordingChannel>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (BridgePoller::new(queue.clone(), Arc::clone(channel), rx), tx)
    }

    #[tokio::test]
    async fn test_delivers_in_creation_order_and_deletes() {
        let (_dir, queue, channel) = setup(RecordingChannel::new());
        queue.set_recipient(55).unwrap();
        write_outbox(&queue, "1700000000002.txt", "second");
        write_outbox(&queue, "1700000000001.txt", "first");

        let (poller, _tx) = poller(&queue, &channel);
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.delivered, 2);
        let texts: Vec<String> = channel.sent().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(channel.sent().iter().all(|s| s.chat_id == 55));
        assert!(queue.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_record_deleted_without_delivery() {
        let (_dir, queue, channel) = setup(RecordingChannel::new());
        queue.set_recipient(55).unwrap();
        write_outbox(&queue, "1.txt", "  \n\t");

        let (poller, _tx) = poller(&queue, &channel);
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.discarded, 1);
        assert!(channel.attempts().is_empty());
        assert!(queue.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_record_is_delivered_lossily() {
        let (_dir, queue, channel) = setup(RecordingChannel::new());
        queue.set_recipient(55).unwrap();
        fs::write(queue.config().outbox_dir().join("1.txt"), [0xff, 0xfe, b'h', b'i']).unwrap();

        let (poller, _tx) = poller(&queue, &channel);
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(channel.sent()[0].text, "\u{fffd}\u{fffd}hi");
        assert!(queue.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_recipient_leaves_records() {
        let (_dir, queue, channel) = setup(RecordingChannel::new());
        write_outbox(&queue, "1.txt", "hello");
        write_outbox(&queue, "2.txt", "");

        let (poller, _tx) = poller(&queue, &channel);
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report, PollReport::default());
        assert!(channel.attempts().is_empty());
        assert_eq!(queue.pending().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_record() {
        let (_dir, queue, channel) = setup(RecordingChannel::failing());
        queue.set_recipient(55).unwrap();
        write_outbox(&queue, "1.txt", "hello");

        let (poller, _tx) = poller(&queue, &channel);
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(queue.pending().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_markdown_rejection_falls_back_per_chunk() {
        let (_dir, queue, channel) = setup(RecordingChannel::rejecting_markdown());
        queue.set_recipient(55).unwrap();
        write_outbox(&queue, "1.txt", "a_b *unbalanced");

        let (poller, _tx) = poller(&queue, &channel);
        poller.poll_once().await.unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].format, TextFormat::Plain);
        assert_eq!(sent[0].text, "a_b *unbalanced");
        assert!(queue.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_long_record_is_chunked() {
        let (_dir, queue, channel) = setup(RecordingChannel::new());
        queue.set_recipient(55).unwrap();
        let text = "x".repeat(5000);
        write_outbox(&queue, "1.txt", &text);

        let (poller, _tx) = poller(&queue, &channel);
        poller.poll_once().await.unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text.chars().count(), 4096);
        assert_eq!(sent[1].text.chars().count(), 904);
    }

    #[tokio::test]
    async fn test_poller_shutdown() {
        let (_dir, queue, channel) = setup(RecordingChannel::new());
        queue.set_recipient(9).unwrap();
        write_outbox(&queue, "1.txt", "queued before start");

        let (mut poller, shutdown_tx) = poller(&queue, &channel);
        let handle = tokio::spawn(async move {
            poller.run().await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "poller should stop after shutdown signal");
        assert_eq!(channel.sent().len(), 1);
    }
}
