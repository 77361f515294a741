//! User-facing notifications (toasts on the web, lines on a terminal).

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Progress or neutral outcome
    Info,
    /// The operation took effect
    Success,
    /// The operation failed or data was discarded
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// Fire-and-forget sink for user-facing outcomes.
pub trait Notifier: Send + Sync {
    /// Report `message`; never fails
    fn notify(&self, kind: NotificationKind, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.as_ref().notify(kind, message)
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, kind: NotificationKind, message: &str) {
        (**self).notify(kind, message)
    }
}

/// Discards everything.
impl Notifier for () {
    fn notify(&self, _kind: NotificationKind, _message: &str) {}
}

/// Adapts a closure into a [`Notifier`].
#[derive(Clone)]
pub struct FnNotifier<F>(pub F);

impl<F> Notifier for FnNotifier<F>
where
    F: Fn(NotificationKind, &str) + Send + Sync,
{
    fn notify(&self, kind: NotificationKind, message: &str) {
        (self.0)(kind, message)
    }
}

/// Emits each notification as a tracing event.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[cfg(feature = "tracing")]
impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Info | NotificationKind::Success => {
                tracing::info!(%kind, "{message}")
            }
            NotificationKind::Error => tracing::warn!(%kind, "{message}"),
        }
    }
}

/// Keeps every notification in memory. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<(NotificationKind, String)>>>);

impl RecordingNotifier {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn entries(&self) -> Vec<(NotificationKind, String)> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<(NotificationKind, String)> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Kinds only, in order
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.entries().into_iter().map(|(kind, _)| kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((kind, message.to_owned()));
    }
}

/// Messages shown for load and save outcomes.
pub mod messages {
    /// Error, stored value was corrupted and replaced by defaults
    pub const LOAD_DISCARDED: &str =
        "Stored configuration was invalid and has been discarded; using defaults";
    /// Success
    pub const SAVE_OK: &str = "Configuration saved";
    /// Error, document failed validation
    pub const SAVE_INVALID: &str = "Configuration is corrupted and was not saved";
    /// Error, storage write failed
    pub const SAVE_FAILED: &str = "Configuration could not be written to storage";
}
