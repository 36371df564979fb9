//! User-visible notification surface.
//!
//! The stores report successes, errors, level/rank celebrations and broken
//! streaks through a [`Notifier`]. Rendering is up to the caller.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Celebration,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Info => "..",
            Severity::Success => "OK",
            Severity::Celebration => "**",
            Severity::Warning => "!!",
            Severity::Error => "XX",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Extension helpers usable on `dyn Notifier`.
pub trait NotifierExt {
    fn send(&self, severity: Severity, message: impl Into<String>);
}

impl NotifierExt for dyn Notifier {
    fn send(&self, severity: Severity, message: impl Into<String>) {
        self.notify(Notification::new(severity, message));
    }
}

/// Writes notifications to the log and, when `echo` is set, to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier {
    echo: bool,
}

impl LogNotifier {
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => error!(target: "notify", "{}", notification.message),
            Severity::Warning => warn!(target: "notify", "{}", notification.message),
            _ => info!(target: "notify", "{}", notification.message),
        }
        if self.echo {
            println!("{}", notification);
        }
    }
}

/// Collects notifications in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<Notification> {
        match self.inner.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.iter().filter(|n| n.severity == severity).count(),
            Err(_) => 0,
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_clones_share_buffer() {
        let notifier = MemoryNotifier::new();
        let handle: Arc<dyn Notifier> = Arc::new(notifier.clone());
        handle.send(Severity::Celebration, "LEVEL UP! You are now level 2!");
        handle.send(Severity::Warning, "streak broken");
        assert_eq!(notifier.count(Severity::Celebration), 1);
        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert!(notifier.drain().is_empty());
    }

    #[test]
    fn display_prefixes_severity() {
        let n = Notification::new(Severity::Error, "Not enough gold");
        assert_eq!(n.to_string(), "[XX] Not enough gold");
    }
}
