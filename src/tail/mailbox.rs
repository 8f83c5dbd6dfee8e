//! # Per-worker mailbox.
//!
//! An unbounded FIFO of [`Notification`]s. The sending half is cheap to clone and
//! safe to use from any thread, including the OS watch callback thread, where it
//! must never block. The receiving half is owned by the worker's actor task, which
//! handles one message at a time.
//!
//! Sending to a mailbox whose receiver is gone (the worker stopped) is a silent no-op.

use tokio::sync::mpsc;

use crate::tail::Notification;

/// Sending half of a worker mailbox.
#[derive(Clone, Debug)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<Notification>,
}

/// Receiving half of a worker mailbox.
#[derive(Debug)]
pub struct MailboxReceiver {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Mailbox {
    /// Creates a connected mailbox pair.
    pub fn channel() -> (Mailbox, MailboxReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Mailbox { tx }, MailboxReceiver { rx })
    }

    /// Enqueues `msg`. Returns `false` if the worker is gone and the message was dropped.
    pub fn tell(&self, msg: Notification) -> bool {
        self.tx.send(msg).is_ok()
    }

    /// Whether the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl MailboxReceiver {
    /// Waits for the next message; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Takes the next message if one is queued.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Empties the queue of snapshots and change notices, which only make sense
    /// to the instance that queued them. Observer errors are moved to `keep` in
    /// arrival order. Returns how many messages were discarded.
    pub fn drain_stale(&mut self, keep: &mut Vec<Notification>) -> usize {
        let mut dropped = 0;
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                Notification::Error { .. } => keep.push(msg),
                Notification::Changed { .. } | Notification::InitialSnapshot { .. } => {
                    dropped += 1
                }
            }
        }
        dropped
    }
}
