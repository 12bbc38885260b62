//! In-memory notification store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use uuid::Uuid;

use super::model::{ListNotifications, Notification, NotificationStatus, SendNotification};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Default)]
pub struct NotificationStore {
    items: DashMap<Uuid, (u64, Notification)>,
    sequence: AtomicU64,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sent notification.
    pub fn insert(&self, request: SendNotification) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient: request.recipient,
            channel: request.channel,
            subject: request.subject,
            body: request.body,
            status: NotificationStatus::Sent,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        };
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.items.insert(notification.id, (seq, notification.clone()));
        notification
    }

    pub fn get(&self, id: Uuid) -> Option<Notification> {
        self.items.get(&id).map(|entry| entry.value().1.clone())
    }

    /// Newest first, filtered and capped by `query`.
    pub fn list(&self, query: &ListNotifications) -> Vec<Notification> {
        let mut matched: Vec<(u64, Notification)> = self
            .items
            .iter()
            .filter(|entry| {
                query
                    .recipient
                    .as_deref()
                    .map_or(true, |recipient| entry.value().1.recipient == recipient)
            })
            .map(|entry| entry.value().clone())
            .collect();

        matched.sort_by(|a, b| b.0.cmp(&a.0));
        matched
            .into_iter()
            .take(query.limit.unwrap_or(DEFAULT_LIMIT))
            .map(|(_, notification)| notification)
            .collect()
    }

    /// Mark as read. `None` if the id is unknown.
    pub fn mark_read(&self, id: Uuid) -> Option<Notification> {
        let mut entry = self.items.get_mut(&id)?;
        entry.value_mut().1.status = NotificationStatus::Read;
        Some(entry.value().1.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
