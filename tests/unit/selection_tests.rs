//! Unit tests for `SelectionMap` validity and quick-keep.
//!
//! Validity is checked exhaustively over every selection combination for a
//! three-lesson group, against an independent statement of the rule.

use lesson_admin::models::duplicate::{
    DetectionMethod, DuplicateGroup, LessonSummary, ResolutionAction, Selection,
};
use lesson_admin::review::SelectionMap;

const LESSONS: [&str; 3] = ["L1", "L2", "L3"];

fn group() -> DuplicateGroup {
    DuplicateGroup {
        group_id: "g".into(),
        lessons: LESSONS
            .iter()
            .map(|id| LessonSummary {
                id: (*id).into(),
                title: "Photosynthesis".into(),
                recommended_canonical: false,
                similarity: None,
            })
            .collect(),
        detection_method: DetectionMethod::SameTitle,
        similarity: None,
    }
}

/// Every choice a single lesson can take.
fn choices() -> Vec<Selection> {
    let mut out = vec![
        Selection::Keep,
        Selection::Archive { archive_to: None },
        Selection::archive_to(""),
    ];
    out.extend(LESSONS.iter().map(|id| Selection::archive_to(*id)));
    out
}

fn expected_valid(selections: &[Selection]) -> bool {
    let any_keep = selections.iter().any(|s| matches!(s, Selection::Keep));
    let targeted = selections.iter().all(|s| match s {
        Selection::Keep => true,
        Selection::Archive { archive_to } => archive_to.as_deref().is_some_and(|t| !t.is_empty()),
    });
    any_keep && targeted
}

#[test]
fn validity_matches_rule_for_every_combination() {
    let choices = choices();
    let mut checked = 0;
    for a in &choices {
        for b in &choices {
            for c in &choices {
                let mut map = SelectionMap::all_keep(&group());
                let combo = [a.clone(), b.clone(), c.clone()];
                for (lesson, selection) in LESSONS.iter().zip(combo.iter()) {
                    assert!(map.set(lesson, selection.clone()));
                }
                assert_eq!(map.is_valid(), expected_valid(&combo), "{combo:?}");
                assert_eq!(
                    map.is_all_keep(),
                    combo.iter().all(Selection::is_keep),
                    "{combo:?}"
                );
                checked += 1;
            }
        }
    }
    assert_eq!(checked, choices.len().pow(3));
}

#[test]
fn all_keep_is_valid() {
    let map = SelectionMap::all_keep(&group());
    assert!(map.is_valid());
    assert!(map.is_all_keep());
    assert_eq!(map.len(), 3);
}

#[test]
fn quick_keep_archives_others_into_kept_lesson() {
    let mut map = SelectionMap::all_keep(&group());
    assert!(map.quick_keep("L2"));

    assert_eq!(map.get("L1"), Some(&Selection::archive_to("L2")));
    assert_eq!(map.get("L2"), Some(&Selection::Keep));
    assert_eq!(map.get("L3"), Some(&Selection::archive_to("L2")));
    assert!(map.is_valid());
    assert!(!map.is_all_keep());
}

#[test]
fn quick_keep_is_idempotent() {
    let mut once = SelectionMap::all_keep(&group());
    once.quick_keep("L3");
    let mut twice = once.clone();
    twice.quick_keep("L3");
    assert_eq!(once, twice);
}

#[test]
fn quick_keep_overrides_earlier_edits() {
    let mut map = SelectionMap::all_keep(&group());
    map.set("L2", Selection::Archive { archive_to: None });
    map.quick_keep("L1");

    let iterated: Vec<(String, Selection)> = map
        .iter()
        .map(|(id, s)| (id.to_owned(), s.clone()))
        .collect();
    assert_eq!(
        iterated,
        [
            ("L1".to_owned(), Selection::Keep),
            ("L2".to_owned(), Selection::archive_to("L1")),
            ("L3".to_owned(), Selection::archive_to("L1")),
        ]
    );
}

#[test]
fn resolutions_carry_action_and_target() {
    let mut map = SelectionMap::all_keep(&group());
    map.quick_keep("L1");

    let resolutions = map.resolutions();
    assert_eq!(resolutions[0].action, ResolutionAction::Keep);
    assert_eq!(resolutions[0].archive_to, None);
    assert_eq!(resolutions[2].action, ResolutionAction::Archive);
    assert_eq!(resolutions[2].archive_to.as_deref(), Some("L1"));
}
