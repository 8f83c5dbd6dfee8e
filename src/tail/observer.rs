//! # File observer: OS change notifications → worker mailbox.
//!
//! Wraps a [`notify::RecommendedWatcher`] scoped to one file. The watch is put on
//! the file's directory (non-recursive) and filtered to the exact file name, so
//! editors that replace the file do not silently kill the watch.
//!
//! ```text
//! OS watch thread                         worker task
//! ───────────────                         ───────────
//! notify event ─► filter(file name, write) ─► Mailbox::tell(Changed)  ─► TailWorker::handle
//! notify error ─────────────────────────────► Mailbox::tell(Error)    ─►
//! ```
//!
//! ## Rules
//! - The callback only enqueues; it never touches worker state.
//! - Watch errors are forwarded, never retried here.
//! - `dispose` is idempotent and safe after a failed `start`.

use notify::event::ModifyKind;
use notify::{Event as FsEvent, EventKind as FsEventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::TailError;
use crate::tail::{Mailbox, Notification, WatchTarget};

/// Native watch for one file, feeding one worker's mailbox.
pub struct FileObserver {
    target: WatchTarget,
    mailbox: Mailbox,
    watcher: Option<RecommendedWatcher>,
}

impl FileObserver {
    /// Creates an observer. Nothing is watched until [`start`](Self::start).
    pub fn new(target: WatchTarget, mailbox: Mailbox) -> Self {
        Self {
            target,
            mailbox,
            watcher: None,
        }
    }

    /// Installs the native watch. A second call on a started observer is a no-op.
    pub fn start(&mut self) -> Result<(), TailError> {
        if self.watcher.is_some() {
            return Ok(());
        }

        let mailbox = self.mailbox.clone();
        let file_name = self.target.file_name().to_os_string();
        let label = self.target.file_name_lossy();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<FsEvent>| {
            let msg = match res {
                Ok(ev) => {
                    if !is_write(&ev.kind) {
                        return;
                    }
                    let Some(name) = ev
                        .paths
                        .iter()
                        .filter_map(|p| p.file_name())
                        .find(|n| *n == file_name.as_os_str())
                    else {
                        return;
                    };
                    Notification::Changed {
                        file_name: name.to_string_lossy().into_owned(),
                    }
                }
                Err(err) => Notification::Error {
                    file_name: label.clone(),
                    reason: err.to_string(),
                },
            };
            mailbox.tell(msg);
        })
        .map_err(|source| self.watch_error(source))?;

        watcher
            .watch(self.target.dir(), RecursiveMode::NonRecursive)
            .map_err(|source| self.watch_error(source))?;

        tracing::debug!(path = %self.target.path().display(), "observer started");
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Whether the native watch is installed.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Releases the native watch. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            let _ = watcher.unwatch(self.target.dir());
            tracing::debug!(path = %self.target.path().display(), "observer disposed");
        }
    }

    fn watch_error(&self, source: notify::Error) -> TailError {
        TailError::Watch {
            path: self.target.path().to_path_buf(),
            source,
        }
    }
}

impl Drop for FileObserver {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Content or last-write changes. Renames, creation and access are not writes.
fn is_write(kind: &FsEventKind) -> bool {
    match kind {
        FsEventKind::Modify(ModifyKind::Name(_)) => false,
        FsEventKind::Modify(_) => true,
        _ => false,
    }
}
