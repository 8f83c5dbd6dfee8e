//! # Report target: where tailed text goes.
//!
//! A report target receives plain strings: the initial snapshot, each append,
//! and `"Tail error: {reason}"` lines. It is shared by reference ([`ReportRef`]),
//! outlives the workers that write to it, and must not block.
//!
//! ```rust
//! use std::sync::Arc;
//! use tailvisor::{ReportFn, ReportRef};
//! use tokio::sync::mpsc;
//!
//! // A channel sender is a report target:
//! let (tx, _rx) = mpsc::unbounded_channel::<String>();
//! let to_channel: ReportRef = Arc::new(tx);
//!
//! // So is a closure:
//! let to_stdout: ReportRef = ReportFn::arc(|text: String| print!("{text}"));
//! # let _ = (to_channel, to_stdout);
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;

/// Consumer of tailed text.
pub trait Report: Send + Sync + 'static {
    /// Delivers one piece of text. Must return promptly.
    fn report(&self, text: String);
}

/// Shared handle to a report target.
pub type ReportRef = Arc<dyn Report>;

impl Report for mpsc::UnboundedSender<String> {
    fn report(&self, text: String) {
        let _ = self.send(text);
    }
}

/// Bounded channel target; text is dropped (and logged) when the consumer lags.
impl Report for mpsc::Sender<String> {
    fn report(&self, text: String) {
        if let Err(err) = self.try_send(text) {
            tracing::warn!(error = %err, "report target rejected text");
        }
    }
}

/// Closure-backed report target.
pub struct ReportFn<F> {
    f: F,
}

impl<F> ReportFn<F>
where
    F: Fn(String) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the closure straight into a [`ReportRef`].
    pub fn arc(f: F) -> ReportRef {
        Arc::new(Self::new(f))
    }
}

impl<F> Report for ReportFn<F>
where
    F: Fn(String) + Send + Sync + 'static,
{
    fn report(&self, text: String) {
        (self.f)(text)
    }
}
