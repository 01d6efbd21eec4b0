//! Ordered queue of pending duplicate groups with pure navigation transitions.

use serde::Serialize;

use crate::models::duplicate::DuplicateGroup;

/// Where the reviewer lands after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "to", content = "group_id", rename_all = "snake_case")]
pub enum Navigation {
    /// Open the group with this id.
    Group(String),
    /// Return to the queue list.
    List,
}

/// Pending groups plus the id of the one being reviewed.
///
/// The current group is always derived by lookup, so a removed group can
/// never stay current by accident.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQueue {
    groups: Vec<DuplicateGroup>,
    current_id: Option<String>,
}

impl ReviewQueue {
    /// Queue over `groups` with nothing open.
    #[must_use]
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        Self {
            groups,
            current_id: None,
        }
    }

    /// Groups in queue order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Number of pending groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no groups are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group with `group_id`, if queued.
    #[must_use]
    pub fn get(&self, group_id: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    /// Zero-based position of `group_id`.
    #[must_use]
    pub fn position(&self, group_id: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.group_id == group_id)
    }

    /// The open group, if any.
    #[must_use]
    pub fn current(&self) -> Option<&DuplicateGroup> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    /// Id of the open group.
    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current().map(|g| g.group_id.as_str())
    }

    /// Open `group_id`. Returns `None` when it is not queued.
    pub fn open(&mut self, group_id: &str) -> Option<&DuplicateGroup> {
        if self.position(group_id).is_none() {
            return None;
        }
        self.current_id = Some(group_id.to_owned());
        self.current()
    }

    /// Close the open group.
    pub fn close(&mut self) {
        self.current_id = None;
    }

    /// Group following `group_id` in the current queue.
    #[must_use]
    pub fn next_after(&self, group_id: &str) -> Navigation {
        self.position(group_id)
            .and_then(|idx| self.groups.get(idx + 1))
            .map_or(Navigation::List, |g| Navigation::Group(g.group_id.clone()))
    }

    /// Remove `group_id` and move to whatever followed it.
    ///
    /// The successor is taken from the queue before removal. The open group
    /// only changes when `group_id` was the open one.
    pub fn complete(&mut self, group_id: &str) -> Navigation {
        let next = self.next_after(group_id);
        self.groups.retain(|g| g.group_id != group_id);
        if self.current_id.as_deref() == Some(group_id) {
            self.follow(&next);
        }
        next
    }

    /// Move past `group_id` without removing it.
    pub fn skip(&mut self, group_id: &str) -> Navigation {
        let next = self.next_after(group_id);
        self.follow(&next);
        next
    }

    fn follow(&mut self, navigation: &Navigation) {
        self.current_id = match navigation {
            Navigation::Group(id) => Some(id.clone()),
            Navigation::List => None,
        };
    }
}
