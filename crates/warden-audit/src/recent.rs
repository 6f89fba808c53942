//! Bounded in-memory cache of recent accesses.
//!
//! Used only for fast "how often has this user opened this resource lately"
//! lookups. It is not the audit record: evicting from it loses nothing,
//! because every access is also in the unbounded trail.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use warden_contracts::identity::UserId;

#[derive(Debug, Clone)]
struct AccessMark {
    user_id: UserId,
    resource: String,
    at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RecentAccessCache {
    capacity: usize,
    marks: VecDeque<AccessMark>,
}

impl RecentAccessCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            marks: VecDeque::new(),
        }
    }

    /// Record an access, evicting the oldest mark when full.
    pub fn record(&mut self, user_id: &UserId, resource: &str, at: DateTime<Utc>) {
        if self.marks.len() == self.capacity {
            self.marks.pop_front();
        }
        self.marks.push_back(AccessMark {
            user_id: user_id.clone(),
            resource: resource.to_string(),
            at,
        });
    }

    /// Remove the newest mark matching all three fields. Returns whether one
    /// was found.
    pub fn forget(&mut self, user_id: &UserId, resource: &str, at: DateTime<Utc>) -> bool {
        let found = self
            .marks
            .iter()
            .rposition(|m| m.at == at && m.user_id == *user_id && m.resource == resource);
        match found {
            Some(i) => self.marks.remove(i).is_some(),
            None => false,
        }
    }

    /// Accesses by `user_id` to `resource` at or after `since`.
    pub fn count_since(&self, user_id: &UserId, resource: &str, since: DateTime<Utc>) -> usize {
        self.marks
            .iter()
            .filter(|m| m.at >= since && m.user_id == *user_id && m.resource == resource)
            .count()
    }

    /// Drop marks older than `cutoff`.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) {
        self.marks.retain(|m| m.at >= cutoff);
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
