//! In-process fan-out of application changes to connected recruiter dashboards.
//!
//! Advisory only: a subscriber that lags or disconnects misses events and there is no
//! replay. Clients should refetch their lists after reconnecting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::application::ApplicationStatus;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationEventKind {
    #[serde(rename = "application.created")]
    Created,
    #[serde(rename = "application.status_changed")]
    StatusChanged,
}

impl ApplicationEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationEventKind::Created => "application.created",
            ApplicationEventKind::StatusChanged => "application.status_changed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationEvent {
    pub kind: ApplicationEventKind,
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub recruiter_id: Uuid,
    pub status: ApplicationStatus,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ApplicationFeed {
    sender: broadcast::Sender<ApplicationEvent>,
}

impl Default for ApplicationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: ApplicationEvent) {
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(subscribers = delivered, "application event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ApplicationEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(recruiter_id: Uuid) -> ApplicationEvent {
        ApplicationEvent {
            kind: ApplicationEventKind::Created,
            application_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            recruiter_id,
            status: ApplicationStatus::Pending,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events_published_after_subscribing() {
        let feed = ApplicationFeed::new();
        feed.publish(event(Uuid::new_v4()));

        let mut rx = feed.subscribe();
        let recruiter = Uuid::new_v4();
        feed.publish(event(recruiter));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.recruiter_id, recruiter);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        ApplicationFeed::new().publish(event(Uuid::new_v4()));
    }

    #[test]
    fn kinds_serialize_with_dotted_names() {
        let json = serde_json::to_value(event(Uuid::new_v4())).unwrap();
        assert_eq!(json["kind"], "application.created");
        assert_eq!(json["status"], "PENDING");
    }
}
