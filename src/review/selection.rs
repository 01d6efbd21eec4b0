//! Per-lesson keep/archive choices for the group under review.

use std::collections::HashMap;

use crate::models::duplicate::{DuplicateGroup, LessonResolution, ResolutionAction, Selection};

/// Lesson id to [`Selection`] for exactly one group.
///
/// Lesson order is remembered so resolutions are emitted in group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMap {
    order: Vec<String>,
    entries: HashMap<String, Selection>,
}

impl SelectionMap {
    /// Every lesson of `group` set to keep.
    #[must_use]
    pub fn all_keep(group: &DuplicateGroup) -> Self {
        let order = group.lesson_ids();
        let entries = order
            .iter()
            .map(|id| (id.clone(), Selection::Keep))
            .collect();
        Self { order, entries }
    }

    /// Selection for `lesson_id`, if the lesson belongs to the map.
    #[must_use]
    pub fn get(&self, lesson_id: &str) -> Option<&Selection> {
        self.entries.get(lesson_id)
    }

    /// Selections in group order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|s| (id.as_str(), s)))
    }

    /// Number of lessons covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the map covers no lessons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Overwrite one lesson's selection. Returns `false` for unknown lessons.
    pub fn set(&mut self, lesson_id: &str, selection: Selection) -> bool {
        match self.entries.get_mut(lesson_id) {
            Some(slot) => {
                *slot = selection;
                true
            }
            None => false,
        }
    }

    /// Keep `lesson_id` and archive every other lesson into it.
    ///
    /// Returns `false` for unknown lessons, leaving the map untouched.
    pub fn quick_keep(&mut self, lesson_id: &str) -> bool {
        if !self.entries.contains_key(lesson_id) {
            return false;
        }
        for (id, slot) in &mut self.entries {
            *slot = if id == lesson_id {
                Selection::Keep
            } else {
                Selection::archive_to(lesson_id)
            };
        }
        true
    }

    /// At least one keep and every archive has a target.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let any_keep = self.entries.values().any(Selection::is_keep);
        let archives_targeted = self
            .entries
            .values()
            .filter(|s| !s.is_keep())
            .all(|s| s.target().is_some());
        any_keep && archives_targeted
    }

    /// Whether every lesson is kept.
    #[must_use]
    pub fn is_all_keep(&self) -> bool {
        self.entries.values().all(Selection::is_keep)
    }

    /// Resolution tuples in group order.
    #[must_use]
    pub fn resolutions(&self) -> Vec<LessonResolution> {
        self.iter()
            .map(|(id, selection)| LessonResolution {
                lesson_id: id.to_owned(),
                action: if selection.is_keep() {
                    ResolutionAction::Keep
                } else {
                    ResolutionAction::Archive
                },
                archive_to: selection.target().map(str::to_owned),
            })
            .collect()
    }
}
