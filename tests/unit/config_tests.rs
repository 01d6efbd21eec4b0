//! Unit tests for configuration parsing and validation.

use std::time::Duration;

use lesson_admin::{config::GlobalConfig, AppError};

fn full_toml(data_dir: &str) -> String {
    format!(
        r#"
data_dir = '{data_dir}'
http_port = 8080
public_url = "https://lessons.example.org/"
retention_days = 14

[platform]
url = "https://project.example.net/"
request_timeout_seconds = 10

[report]
path = "reports/duplicates.json"

[review]
dismiss_reason = "Not duplicates"
recently_resolved_ttl_seconds = 60

[invitations]
expiry_days = 3
"#
    )
}

fn minimal_toml(data_dir: &str) -> String {
    format!(
        r#"
data_dir = '{data_dir}'
public_url = "https://lessons.example.org"

[report]
path = "duplicates.json"
"#
    )
}

#[test]
fn parses_full_config() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig::from_toml_str(&full_toml(temp.path().to_str().expect("utf8")))
        .expect("config parses");

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.retention_days, 14);
    assert_eq!(config.public_url, "https://lessons.example.org");
    assert_eq!(config.platform.url, "https://project.example.net");
    assert_eq!(config.platform.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.review.dismiss_reason, "Not duplicates");
    assert_eq!(config.recently_resolved_ttl(), Duration::from_secs(60));
    assert_eq!(config.invitations.expiry_days, 3);
    assert!(config.platform.service_key.is_empty());
}

#[test]
fn minimal_config_uses_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig::from_toml_str(&minimal_toml(temp.path().to_str().expect("utf8")))
        .expect("config parses");

    assert_eq!(config.http_port, 3000);
    assert_eq!(config.retention_days, 30);
    assert!(!config.platform.is_configured());
    assert_eq!(config.invitations.expiry_days, 7);
    assert_eq!(config.recently_resolved_ttl(), Duration::from_secs(300));
    assert!(!config.review.dismiss_reason.is_empty());
}

#[test]
fn relative_paths_resolve_against_data_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig::from_toml_str(&full_toml(temp.path().to_str().expect("utf8")))
        .expect("config parses");

    let root = temp.path().canonicalize().expect("canonical");
    assert_eq!(config.data_dir, root);
    assert_eq!(config.report_path(), root.join("reports/duplicates.json"));
    assert_eq!(config.db_path(), root.join("lesson-admin.db"));
}

#[test]
fn absolute_report_path_is_kept() {
    let temp = tempfile::tempdir().expect("tempdir");
    let report = temp.path().join("elsewhere.json");
    let toml = format!(
        r#"
data_dir = '{}'
public_url = "https://lessons.example.org"

[report]
path = '{}'
"#,
        temp.path().to_str().expect("utf8"),
        report.to_str().expect("utf8")
    );
    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");
    assert_eq!(config.report_path(), report);
}

#[test]
fn missing_report_section_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "data_dir = '{}'\npublic_url = \"https://lessons.example.org\"\n",
        temp.path().to_str().expect("utf8")
    );
    let result = GlobalConfig::from_toml_str(&toml);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn empty_public_url_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = minimal_toml(temp.path().to_str().expect("utf8"))
        .replace("https://lessons.example.org", " ");
    let err = GlobalConfig::from_toml_str(&toml).expect_err("empty url");
    assert!(err.to_string().contains("public_url"));
}

#[test]
fn non_http_platform_url_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = full_toml(temp.path().to_str().expect("utf8"))
        .replace("https://project.example.net/", "ftp://project.example.net");
    let err = GlobalConfig::from_toml_str(&toml).expect_err("bad scheme");
    assert!(err.to_string().contains("platform.url"));
}

#[test]
fn zero_invitation_expiry_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = full_toml(temp.path().to_str().expect("utf8"))
        .replace("expiry_days = 3", "expiry_days = 0");
    let err = GlobalConfig::from_toml_str(&toml).expect_err("zero expiry");
    assert!(err.to_string().contains("expiry_days"));
}

#[test]
fn missing_data_dir_is_rejected() {
    let toml = minimal_toml("/definitely/not/a/real/dir");
    let err = GlobalConfig::from_toml_str(&toml).expect_err("missing dir");
    assert!(err.to_string().contains("data_dir"));
}

#[test]
fn load_from_path_reads_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("config.toml");
    std::fs::write(&path, minimal_toml(temp.path().to_str().expect("utf8"))).expect("write");

    let config = GlobalConfig::load_from_path(&path).expect("load");
    assert_eq!(config.public_url, "https://lessons.example.org");

    let err = GlobalConfig::load_from_path(temp.path().join("absent.toml")).expect_err("absent");
    assert!(matches!(err, AppError::Config(_)));
}
