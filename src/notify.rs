use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Destructive,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub kind: NoticeKind,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, description)
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeKind::Destructive, title, description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, description)
    }

    fn new(kind: NoticeKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind,
        }
    }
}

/// Fire-and-forget sink for user-facing feedback.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Where the user should be sent next. Only used when the session expires.
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, path: &str);
}

/// Logs every notice and keeps the most recent ones until the page drains them.
#[derive(Debug)]
pub struct NoticeBoard {
    capacity: usize,
    pending: Mutex<VecDeque<Notification>>,
}

impl NoticeBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NoticeKind::Destructive => warn!(
                title = %notification.title,
                description = %notification.description,
                "notice"
            ),
            NoticeKind::Success | NoticeKind::Info => info!(
                title = %notification.title,
                description = %notification.description,
                "notice"
            ),
        }
        let mut pending = self.lock();
        pending.push_back(notification);
        while pending.len() > self.capacity {
            pending.pop_front();
        }
    }
}

/// Holds the latest redirect target until the web layer picks it up.
#[derive(Debug, Default)]
pub struct RedirectSlot {
    target: Mutex<Option<String>>,
}

impl RedirectSlot {
    pub fn take(&self) -> Option<String> {
        self.target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl Navigator for RedirectSlot {
    fn redirect_to(&self, path: &str) {
        info!(path, "redirect requested");
        *self
            .target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(path.to_string());
    }
}
