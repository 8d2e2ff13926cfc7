//! Module for user-facing notifications.
//!
//! Operations that are driven by a user (uploads, deletes, session expiry, ...) do
//! not fail loudly. Instead they report what happened through a [`Notifier`] and leave
//! the state usable.

use std::sync::Mutex;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    /// Intermediate state of a long-running operation.
    Progress,
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn new<S: Into<String>>(level: Level, message: S) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn progress<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Progress, message)
    }

    pub fn success<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Error, message)
    }
}

/// A sink for notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// A notifier that writes notices to the [`log`] facade.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Error => log::error!("{}", notice.message),
            Level::Progress => log::debug!("{}", notice.message),
            Level::Info | Level::Success => log::info!("{}", notice.message),
        }
    }
}

/// A notifier that keeps every notice in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    /// Returns the messages of all notices with the given level.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|v| v.level == level)
            .map(|v| v.message.clone())
            .collect()
    }

    /// Removes all notices and returns them.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        // A panic while pushing cannot leave the vector half-written.
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.lock().push(notice);
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}
