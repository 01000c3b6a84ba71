//! Reminder notifications.

use async_trait::async_trait;
use goalplan_core::Time;
use tokio::sync::Mutex;
use tracing::info;

/// A reminder as handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline
    pub title: String,
    /// Body text
    pub body: String,
    /// When it should fire
    pub at: Time,
}

/// Schedules reminders. Delivery is the implementation's business.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Schedule a reminder for `at`.
    async fn schedule_notification(&self, title: &str, body: &str, at: Time);
}

/// Writes reminders to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn schedule_notification(&self, title: &str, body: &str, at: Time) {
        info!(%at, title, body, "notification scheduled");
    }
}

/// Keeps every reminder it is given.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reminders received so far, in order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn schedule_notification(&self, title: &str, body: &str, at: Time) {
        self.sent.lock().await.push(Notification {
            title: title.to_string(),
            body: body.to_string(),
            at,
        });
    }
}
