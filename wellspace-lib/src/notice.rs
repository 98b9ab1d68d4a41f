//! User-facing notifications

use std::sync::Arc;
use std::sync::Mutex;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message meant for a toast or status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// Creates a success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Creates an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<F> Notifier for F
where
    F: Fn(Notice) + Send + Sync,
{
    fn notify(&self, notice: Notice) {
        self(notice)
    }
}

/// A notifier that keeps every notice until drained.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every notice so far.
    pub fn drain(&self) -> Vec<Notice> {
        let mut notices = match self.notices.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *notices)
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        let mut notices = match self.notices.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        notices.push(notice);
    }
}
