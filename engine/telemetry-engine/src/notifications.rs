//! Status-change notification feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A message raised when a device goes offline or comes back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub device_id: String,
    pub message: String,
    pub time: DateTime<Utc>,
    pub read: bool,
}

/// Bounded feed, newest first
#[derive(Debug)]
pub struct NotificationFeed {
    entries: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity: capacity.max(1), next_id: 1 }
    }

    /// Record a notification, evicting the oldest one when full. Returns its ID.
    pub fn push(&mut self, device_id: &str, message: String, time: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_front(Notification {
            id,
            device_id: device_id.to_string(),
            message,
            time,
            read: false,
        });
        self.entries.truncate(self.capacity);
        id
    }

    /// Mark one notification as read; unknown IDs are ignored
    pub fn mark_as_read(&mut self, id: u64) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        self.entries.iter_mut().for_each(|n| n.read = true);
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    /// Newest first
    pub fn list(&self) -> Vec<Notification> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_is_bounded_and_newest_first() {
        let mut feed = NotificationFeed::new(3);
        for i in 0..5 {
            feed.push("DEV-1001", format!("event {i}"), Utc::now());
        }

        let list = feed.list();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].message, "event 4");
        assert_eq!(list[2].message, "event 2");
        assert_eq!(feed.unread_count(), 3);
    }

    #[test]
    fn test_mark_as_read() {
        let mut feed = NotificationFeed::new(10);
        let first = feed.push("DEV-1001", "went offline".to_string(), Utc::now());
        feed.push("DEV-1002", "came back online".to_string(), Utc::now());

        assert!(feed.mark_as_read(first));
        assert_eq!(feed.unread_count(), 1);

        assert!(!feed.mark_as_read(999));

        feed.mark_all_read();
        assert_eq!(feed.unread_count(), 0);
        assert_eq!(feed.len(), 2);
    }
}
