use std::path::PathBuf;

/// A message in a tail worker's mailbox.
///
/// `Changed` and `Error` come from the worker's [`FileObserver`](crate::FileObserver);
/// `InitialSnapshot` is sent by the worker to itself at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The watched file was written to.
    Changed { file_name: String },
    /// The OS watch subsystem reported an error.
    Error { file_name: String, reason: String },
    /// Full content of the file at start-up.
    InitialSnapshot { path: PathBuf, text: String },
}

impl Notification {
    /// Short label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Notification::Changed { .. } => "changed",
            Notification::Error { .. } => "error",
            Notification::InitialSnapshot { .. } => "initial_snapshot",
        }
    }
}
