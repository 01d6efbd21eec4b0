//! Unit tests for report parsing and the report-backed group source.

use std::io::Write;
use std::sync::Arc;

use lesson_admin::models::duplicate::DetectionMethod;
use lesson_admin::models::resolution::{ResolutionKind, ResolutionRecord};
use lesson_admin::persistence::db;
use lesson_admin::persistence::resolution_repo::ResolutionRepo;
use lesson_admin::report::{DuplicateReport, ReportGroupSource};
use lesson_admin::review::GroupSource;
use lesson_admin::AppError;

const REPORT: &str = r#"{
    "schema_version": 3,
    "generated_at": "2026-10-01T04:00:00Z",
    "groups": [
        {
            "group_id": "g-001",
            "detection_method": "same_title",
            "similarity": 0.97,
            "lessons": [
                { "lesson_id": "L1", "title": "Fractions", "recommended_canonical": true },
                { "lesson_id": "L2", "title": "Fractions", "similarity": 0.97 }
            ]
        },
        {
            "group_id": "g-002",
            "detection_method": "embedding",
            "lessons": [
                { "lesson_id": "L3", "title": "Water cycle" },
                { "lesson_id": "L4", "title": "The water cycle" },
                { "lesson_id": "L5", "title": "Water Cycle intro" }
            ]
        }
    ]
}"#;

fn report_with_groups(groups: &str) -> String {
    format!(
        r#"{{"schema_version": 3, "generated_at": "2026-10-01T04:00:00Z", "groups": {groups}}}"#
    )
}

#[test]
fn parses_groups_in_report_order() {
    let report = DuplicateReport::from_json(REPORT).expect("parse");
    assert_eq!(report.generated_at.to_rfc3339(), "2026-10-01T04:00:00+00:00");
    assert_eq!(report.groups.len(), 2);

    let first = &report.groups[0];
    assert_eq!(first.group_id, "g-001");
    assert_eq!(first.detection_method, DetectionMethod::SameTitle);
    assert_eq!(first.similarity, Some(0.97));
    assert_eq!(first.lesson_ids(), ["L1", "L2"]);
    assert_eq!(first.recommended().map(|l| l.id.as_str()), Some("L1"));
    assert_eq!(first.lessons[1].similarity, Some(0.97));

    let second = &report.groups[1];
    assert_eq!(second.detection_method, DetectionMethod::Embedding);
    assert!(second.recommended().is_none());
    assert!(second.contains("L5"));
    assert!(!second.contains("L1"));
}

#[test]
fn duplicate_group_id_is_rejected() {
    let raw = report_with_groups(
        r#"[
            {"group_id": "g", "detection_method": "mixed",
             "lessons": [{"lesson_id": "A", "title": "a"}, {"lesson_id": "B", "title": "b"}]},
            {"group_id": "g", "detection_method": "mixed",
             "lessons": [{"lesson_id": "C", "title": "c"}, {"lesson_id": "D", "title": "d"}]}
        ]"#,
    );
    let err = DuplicateReport::from_json(&raw).expect_err("duplicate id");
    assert!(matches!(err, AppError::Report(ref msg) if msg.contains("duplicate group_id g")));
}

#[test]
fn empty_identifiers_are_rejected() {
    let empty_group = report_with_groups(
        r#"[{"group_id": " ", "detection_method": "mixed",
             "lessons": [{"lesson_id": "A", "title": "a"}, {"lesson_id": "B", "title": "b"}]}]"#,
    );
    assert!(matches!(
        DuplicateReport::from_json(&empty_group),
        Err(AppError::Report(_))
    ));

    let empty_lesson = report_with_groups(
        r#"[{"group_id": "g", "detection_method": "mixed",
             "lessons": [{"lesson_id": "", "title": "a"}, {"lesson_id": "B", "title": "b"}]}]"#,
    );
    assert!(matches!(
        DuplicateReport::from_json(&empty_lesson),
        Err(AppError::Report(_))
    ));
}

#[test]
fn repeated_lesson_within_group_is_rejected() {
    let raw = report_with_groups(
        r#"[{"group_id": "g", "detection_method": "same_title",
             "lessons": [{"lesson_id": "L1", "title": "a"},
                         {"lesson_id": "L2", "title": "a"},
                         {"lesson_id": "L1", "title": "a"}]}]"#,
    );
    let err = DuplicateReport::from_json(&raw).expect_err("repeated lesson");
    assert!(matches!(err, AppError::Report(ref msg) if msg.contains("lesson L1 more than once")));
}

#[test]
fn same_lesson_in_two_groups_is_accepted() {
    let raw = report_with_groups(
        r#"[{"group_id": "g1", "detection_method": "same_title",
             "lessons": [{"lesson_id": "L1", "title": "a"}, {"lesson_id": "L2", "title": "a"}]},
            {"group_id": "g2", "detection_method": "embedding",
             "lessons": [{"lesson_id": "L1", "title": "a"}, {"lesson_id": "L3", "title": "b"}]}]"#,
    );
    let report = DuplicateReport::from_json(&raw).expect("parse");
    assert_eq!(report.groups.len(), 2);
}

#[test]
fn unknown_top_level_field_is_rejected() {
    let raw = r#"{"schema_version": 3, "generated_at": "2026-10-01T04:00:00Z",
                  "groups": [], "clusters": []}"#;
    assert!(matches!(
        DuplicateReport::from_json(raw),
        Err(AppError::Report(_))
    ));
}

#[test]
fn unknown_detection_method_is_rejected() {
    let raw = report_with_groups(
        r#"[{"group_id": "g", "detection_method": "fuzzy",
             "lessons": [{"lesson_id": "A", "title": "a"}, {"lesson_id": "B", "title": "b"}]}]"#,
    );
    assert!(DuplicateReport::from_json(&raw).is_err());
}

// ── ReportGroupSource ────────────────────────────────────

fn write_report(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write report");
    file.flush().expect("flush report");
    file
}

#[tokio::test]
async fn source_hides_journaled_groups_unless_requested() {
    let file = write_report(REPORT);
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    let journal = ResolutionRepo::new(db);
    journal
        .record(&ResolutionRecord::new(
            "g-001".into(),
            ResolutionKind::Resolved,
            "reviewer-1".into(),
            1,
            1,
            None,
        ))
        .await
        .expect("journal");

    let source = ReportGroupSource::new(file.path().to_path_buf(), journal);

    let pending = source.fetch_groups(false).await.expect("fetch pending");
    let ids: Vec<_> = pending.iter().map(|g| g.group_id.as_str()).collect();
    assert_eq!(ids, ["g-002"]);

    let all = source.fetch_groups(true).await.expect("fetch all");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn source_rereads_the_file_on_every_fetch() {
    let mut file = write_report(&report_with_groups("[]"));
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    let source = ReportGroupSource::new(file.path().to_path_buf(), ResolutionRepo::new(db));

    assert!(source.fetch_groups(false).await.expect("fetch").is_empty());

    std::fs::write(file.path(), REPORT).expect("rewrite report");
    file.flush().expect("flush");
    assert_eq!(source.fetch_groups(false).await.expect("fetch").len(), 2);
}

#[tokio::test]
async fn missing_report_file_is_report_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    let source = ReportGroupSource::new(dir.path().join("absent.json"), ResolutionRepo::new(db));

    let err = source.fetch_groups(false).await.expect_err("missing file");
    assert!(matches!(err, AppError::Report(ref msg) if msg.contains("cannot read")));
}
