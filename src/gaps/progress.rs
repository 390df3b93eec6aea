//! Progress events published by scans

use tokio::sync::mpsc;

/// One progress tick: `(label, current, total)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub label: String,
    pub current: usize,
    /// `None` for indeterminate phases
    pub total: Option<usize>,
}

/// Publishing half of a progress channel.
///
/// Sending never blocks; events are dropped once the receiver is gone.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSender {
    /// A sender that discards every event
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, label: impl Into<String>, current: usize, total: Option<usize>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent {
                label: label.into(),
                current,
                total,
            });
        }
    }
}

/// Create a progress channel
pub fn channel() -> (ProgressSender, mpsc::UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx: Some(tx) }, rx)
}
