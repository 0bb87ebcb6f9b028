//! Notification sinks

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::domain::value_objects::UserId;
use crate::ports::outbound::{Notification, NotificationKind, NotificationSink};

/// Keeps delivered notifications per recipient, plus delivery order
#[derive(Default)]
pub struct InMemoryNotificationSink {
    by_user: DashMap<UserId, Vec<Notification>>,
    log: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(&self, user_id: &UserId) -> Vec<Notification> {
        self.by_user.get(user_id).map(|n| n.clone()).unwrap_or_default()
    }

    /// Everything delivered, oldest first
    pub fn all(&self) -> Vec<Notification> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.by_user.clear();
        self.log.lock().clear();
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn deliver(&self, notification: Notification) {
        self.by_user.entry(notification.user_id.clone()).or_default().push(notification.clone());
        self.log.lock().push(notification);
    }
}

/// Writes each notification to the tracing log
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNotificationSink;

impl NotificationSink for LoggingNotificationSink {
    fn deliver(&self, n: Notification) {
        let link = n.link.as_deref().unwrap_or("");
        match n.kind {
            NotificationKind::Error | NotificationKind::Warning => {
                tracing::warn!(user_id = %n.user_id, title = %n.title, link, "{}", n.message)
            }
            NotificationKind::Info | NotificationKind::Success => {
                tracing::info!(user_id = %n.user_id, title = %n.title, link, "{}", n.message)
            }
        }
    }
}
