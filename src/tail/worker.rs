//! # TailWorker: one file, one read handle, one observer.
//!
//! ```text
//! start(path)
//!   ├─► WatchTarget::resolve      (absolute path, dir, file name)
//!   ├─► open read handle          (shared with writers)
//!   ├─► FileObserver::start       (OS watch → own mailbox)
//!   └─► read to EOF ─► tell(InitialSnapshot)
//!
//! handle(msg)
//!   ├─ InitialSnapshot{text} ─► report(text)              (even when empty)
//!   ├─ Changed               ─► read cursor..EOF ─► report if non-empty
//!   └─ Error{reason}         ─► report("Tail error: {reason}")
//!
//! dispose()
//!   └─► observer first, then read handle (idempotent)
//! ```
//!
//! ## Rules
//! - Every `Changed` reads everything written since the last read, so any number
//!   of coalesced OS events is equivalent to one.
//! - The snapshot is the first text an instance reports: a `Changed` that gets
//!   ahead of the snapshot in the mailbox is deferred until the snapshot is out.
//! - Bytes are decoded as a UTF-8 stream: a leading BOM is dropped, a multi-byte
//!   sequence split across two reads is joined, invalid bytes become U+FFFD.
//! - A file that shrank below the cursor is a [`TailError::Truncated`] fault.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::TailError;
use crate::tail::{FileObserver, Mailbox, Notification, ReportRef, Tail, WatchTarget};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Tails one file on behalf of one report target.
pub struct TailWorker {
    requested: PathBuf,
    target: WatchTarget,
    report: ReportRef,
    mailbox: Mailbox,
    observer: Option<FileObserver>,
    reader: Option<File>,
    position: u64,
    decoder: Utf8Stream,
    snapshot_delivered: bool,
    deferred_change: bool,
}

impl TailWorker {
    /// Runs start-up: resolve, open, watch, snapshot.
    ///
    /// On success the [`Notification::InitialSnapshot`] is already queued in
    /// `mailbox`. On failure everything acquired so far has been released.
    pub fn start(
        path: impl AsRef<Path>,
        report: ReportRef,
        mailbox: Mailbox,
    ) -> Result<Self, TailError> {
        let requested = path.as_ref().to_path_buf();
        let target = WatchTarget::resolve(&requested)?;

        // Dropping `worker` on any early return disposes what it holds.
        let mut worker = Self {
            requested,
            target,
            report,
            mailbox,
            observer: None,
            reader: None,
            position: 0,
            decoder: Utf8Stream::default(),
            snapshot_delivered: false,
            deferred_change: false,
        };

        worker.open()?;

        let observer = worker
            .observer
            .insert(FileObserver::new(worker.target.clone(), worker.mailbox.clone()));
        observer.start()?;

        let text = worker.read_available()?;
        worker.mailbox.tell(Notification::InitialSnapshot {
            path: worker.requested.clone(),
            text,
        });

        tracing::debug!(path = %worker.target.path().display(), bytes = worker.position, "tail started");
        Ok(worker)
    }

    /// The resolved file this worker tails.
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Handles one mailbox message.
    pub fn handle(&mut self, msg: Notification) -> Result<(), TailError> {
        match msg {
            Notification::InitialSnapshot { text, .. } => {
                self.report.report(text);
                self.snapshot_delivered = true;
                if std::mem::take(&mut self.deferred_change) {
                    self.forward_appended()?;
                }
            }
            Notification::Changed { .. } if !self.snapshot_delivered => {
                self.deferred_change = true;
            }
            Notification::Changed { .. } => self.forward_appended()?,
            Notification::Error { reason, .. } => {
                self.report.report(format!("Tail error: {reason}"));
            }
        }
        Ok(())
    }

    /// Releases the observer, then the read handle. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.dispose();
        }
        if self.reader.take().is_some() {
            tracing::debug!(path = %self.target.path().display(), "read handle closed");
        }
    }

    fn open(&mut self) -> Result<(), TailError> {
        let path = self.target.path();
        let open_error = |source| TailError::Open {
            path: path.to_path_buf(),
            source,
        };

        // std opens with read/write/delete sharing on Windows; Unix has no share modes.
        let file = File::open(path).map_err(open_error)?;
        let meta = file.metadata().map_err(open_error)?;
        if !meta.is_file() {
            return Err(TailError::NotSupported {
                reason: format!("{} is not a regular file", path.display()),
            });
        }

        self.reader = Some(file);
        Ok(())
    }

    fn forward_appended(&mut self) -> Result<(), TailError> {
        let text = self.read_available()?;
        if !text.is_empty() {
            self.report.report(text);
        }
        Ok(())
    }

    /// Reads from the cursor to end-of-file and decodes what arrived.
    fn read_available(&mut self) -> Result<String, TailError> {
        let path = self.target.path();
        let read_error = |source| TailError::Read {
            path: path.to_path_buf(),
            source,
        };

        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| read_error(io::Error::other("read handle disposed")))?;

        let len = reader.metadata().map_err(read_error)?.len();
        if len < self.position {
            return Err(TailError::Truncated {
                path: path.to_path_buf(),
                position: self.position,
                len,
            });
        }

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(read_error)?;

        self.position = self
            .position
            .checked_add(bytes.len() as u64)
            .ok_or_else(|| TailError::Arithmetic {
                reason: format!("cursor overflow at {} + {}", self.position, bytes.len()),
            })?;

        Ok(self.decoder.decode(&bytes))
    }
}

impl Tail for TailWorker {
    fn handle(&mut self, msg: Notification) -> Result<(), TailError> {
        TailWorker::handle(self, msg)
    }

    fn dispose(&mut self) {
        TailWorker::dispose(self)
    }
}

impl Drop for TailWorker {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Incremental UTF-8 decoder that carries incomplete trailing sequences.
#[derive(Debug, Default)]
struct Utf8Stream {
    carry: Vec<u8>,
    started: bool,
}

impl Utf8Stream {
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(chunk);

        let mut rest: &[u8] = &buf;
        if !self.started && !rest.is_empty() {
            self.started = true;
            rest = rest.strip_prefix(UTF8_BOM).unwrap_or(rest);
        }

        let mut out = String::with_capacity(rest.len());
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use crate::tail::MailboxReceiver;
    use std::io::Write;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Fixture {
        _dir: tempfile::TempDir,
        file: PathBuf,
        report_rx: mpsc::UnboundedReceiver<String>,
        mailbox_rx: MailboxReceiver,
        worker: TailWorker,
    }

    fn fixture(initial: &[u8]) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("tail.log");
        std::fs::write(&file, initial).expect("write");

        let (report_tx, report_rx) = mpsc::unbounded_channel::<String>();
        let (mailbox, mailbox_rx) = Mailbox::channel();
        let worker = TailWorker::start(&file, Arc::new(report_tx), mailbox).expect("start");

        Fixture {
            _dir: dir,
            file,
            report_rx,
            mailbox_rx,
            worker,
        }
    }

    fn append(path: &Path, bytes: &[u8]) {
        std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(bytes))
            .expect("append");
    }

    fn take_snapshot(rx: &mut MailboxReceiver) -> Notification {
        while let Some(msg) = rx.try_recv() {
            if matches!(msg, Notification::InitialSnapshot { .. }) {
                return msg;
            }
        }
        panic!("no initial snapshot queued");
    }

    fn changed() -> Notification {
        Notification::Changed {
            file_name: "tail.log".into(),
        }
    }

    fn reported(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(text) = rx.try_recv() {
            out.push(text);
        }
        out
    }

    #[test]
    fn test_snapshot_is_queued_and_forwarded_verbatim() {
        let mut fx = fixture(b"line one\nline two\n");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        assert_eq!(
            snap,
            Notification::InitialSnapshot {
                path: fx.file.clone(),
                text: "line one\nline two\n".into()
            }
        );

        fx.worker.handle(snap).expect("handle");
        assert_eq!(reported(&mut fx.report_rx), vec!["line one\nline two\n"]);
    }

    #[test]
    fn test_empty_snapshot_is_still_forwarded() {
        let mut fx = fixture(b"");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");
        assert_eq!(reported(&mut fx.report_rx), vec![String::new()]);
    }

    #[test]
    fn test_changed_reads_only_new_text() {
        let mut fx = fixture(b"old\n");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");

        append(&fx.file, b"hello\n");
        fx.worker.handle(changed()).expect("changed");
        append(&fx.file, b"world\n");
        append(&fx.file, b"world\n");
        fx.worker.handle(changed()).expect("changed");

        assert_eq!(
            reported(&mut fx.report_rx),
            vec!["old\n", "hello\n", "world\nworld\n"]
        );
        assert_eq!(fx.worker.position(), 4 + 6 + 12);
    }

    #[test]
    fn test_changed_at_eof_reports_nothing() {
        let mut fx = fixture(b"abc");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");
        reported(&mut fx.report_rx);

        fx.worker.handle(changed()).expect("changed");
        fx.worker.handle(changed()).expect("changed");
        assert!(reported(&mut fx.report_rx).is_empty());
    }

    #[test]
    fn test_observer_error_is_reported_and_worker_continues() {
        let mut fx = fixture(b"");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");
        reported(&mut fx.report_rx);

        fx.worker
            .handle(Notification::Error {
                file_name: "tail.log".into(),
                reason: "disk full".into(),
            })
            .expect("error message is not a fault");
        append(&fx.file, b"after\n");
        fx.worker.handle(changed()).expect("changed");

        assert_eq!(
            reported(&mut fx.report_rx),
            vec!["Tail error: disk full", "after\n"]
        );
    }

    #[test]
    fn test_change_ahead_of_snapshot_is_deferred() {
        let mut fx = fixture(b"first\n");
        let snap = take_snapshot(&mut fx.mailbox_rx);

        append(&fx.file, b"second\n");
        fx.worker.handle(changed()).expect("changed");
        assert!(reported(&mut fx.report_rx).is_empty());

        fx.worker.handle(snap).expect("snapshot");
        assert_eq!(reported(&mut fx.report_rx), vec!["first\n", "second\n"]);
    }

    #[test]
    fn test_split_utf8_sequence_is_joined() {
        let mut fx = fixture(b"");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");
        reported(&mut fx.report_rx);

        append(&fx.file, b"caf\xC3");
        fx.worker.handle(changed()).expect("changed");
        append(&fx.file, b"\xA9\n");
        fx.worker.handle(changed()).expect("changed");

        assert_eq!(reported(&mut fx.report_rx), vec!["caf", "\u{e9}\n"]);
    }

    #[test]
    fn test_bom_is_stripped_from_snapshot() {
        let mut fx = fixture(b"\xEF\xBB\xBFhello");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");
        assert_eq!(reported(&mut fx.report_rx), vec!["hello"]);
    }

    #[test]
    fn test_truncation_is_a_fault() {
        let mut fx = fixture(b"0123456789");
        let snap = take_snapshot(&mut fx.mailbox_rx);
        fx.worker.handle(snap).expect("handle");

        std::fs::write(&fx.file, b"01").expect("truncate");
        let err = fx.worker.handle(changed()).unwrap_err();
        assert!(matches!(err, TailError::Truncated { position: 10, len: 2, .. }));
        assert_eq!(err.kind(), FaultKind::Other);
    }

    #[test]
    fn test_directory_is_not_supported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (report_tx, _report_rx) = mpsc::unbounded_channel::<String>();
        let (mailbox, _mailbox_rx) = Mailbox::channel();

        let err = TailWorker::start(dir.path(), Arc::new(report_tx), mailbox)
            .err()
            .expect("directory must be rejected");
        assert_eq!(err.kind(), FaultKind::NotSupported);
    }

    #[test]
    fn test_missing_file_fails_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (report_tx, _report_rx) = mpsc::unbounded_channel::<String>();
        let (mailbox, mut mailbox_rx) = Mailbox::channel();

        let err = TailWorker::start(dir.path().join("nope.log"), Arc::new(report_tx), mailbox)
            .err()
            .expect("missing file must fail");
        assert_eq!(err.kind(), FaultKind::Other);
        assert!(mailbox_rx.try_recv().is_none());
    }

    #[test]
    fn test_dispose_is_idempotent_and_ends_reading() {
        let mut fx = fixture(b"x");
        fx.worker.dispose();
        fx.worker.dispose();

        let err = fx.worker.handle(Notification::InitialSnapshot {
            path: fx.file.clone(),
            text: String::new(),
        });
        assert!(err.is_ok());
        let err = fx.worker.handle(changed()).unwrap_err();
        assert_eq!(err.as_label(), "tail_read");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut stream = Utf8Stream::default();
        assert_eq!(stream.decode(b"a\xFFb"), "a\u{FFFD}b");
        assert_eq!(stream.decode(b"\xE2\x82"), "");
        assert_eq!(stream.decode(b"\xAC"), "\u{20AC}");
    }
}
