use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Emitted by the classifier after a scan has been committed to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceEvent {
    CheckedIn {
        user_id: u64,
        user_name: String,
        shift_date: NaiveDate,
        at: NaiveDateTime,
    },
    CheckedOut {
        user_id: u64,
        user_name: String,
        shift_date: NaiveDate,
        at: NaiveDateTime,
    },
}

impl AttendanceEvent {
    pub fn title(&self) -> &'static str {
        match self {
            AttendanceEvent::CheckedIn { .. } => "Check-in recorded",
            AttendanceEvent::CheckedOut { .. } => "Check-out recorded",
        }
    }

    pub fn body(&self) -> String {
        match self {
            AttendanceEvent::CheckedIn {
                user_name,
                shift_date,
                at,
                ..
            } => format!(
                "{} checked in at {} for shift {}",
                user_name,
                at.format("%H:%M"),
                shift_date
            ),
            AttendanceEvent::CheckedOut {
                user_name,
                shift_date,
                at,
                ..
            } => format!(
                "{} checked out at {} for shift {}",
                user_name,
                at.format("%H:%M"),
                shift_date
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipients: &[u64],
        title: &str,
        body: &str,
        image_url: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of a push service.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipients: &[u64],
        title: &str,
        body: &str,
        image_url: Option<&str>,
    ) -> anyhow::Result<()> {
        info!(?recipients, title, body, image_url, "Notification");
        Ok(())
    }
}

/// Sends attendance events to the fixed observer set, off the request path.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    recipients: Vec<u64>,
    image_url: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, recipients: Vec<u64>, image_url: Option<String>) -> Self {
        Self {
            notifier,
            recipients,
            image_url,
        }
    }

    /// Fire-and-forget. Must be called from within the actix runtime.
    pub fn dispatch(&self, event: AttendanceEvent) {
        let this = self.clone();
        actix_web::rt::spawn(async move {
            this.deliver(&event).await;
        });
    }

    /// Delivers one event. Failures are logged and dropped.
    pub async fn deliver(&self, event: &AttendanceEvent) {
        if self.recipients.is_empty() {
            debug!(?event, "No notification recipients configured");
            return;
        }

        if let Err(e) = self
            .notifier
            .notify(
                &self.recipients,
                event.title(),
                &event.body(),
                self.image_url.as_deref(),
            )
            .await
        {
            warn!(error = %e, ?event, "Failed to send attendance notification");
        }
    }
}
