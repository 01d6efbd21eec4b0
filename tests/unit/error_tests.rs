//! Unit tests for `AppError` display and conversions.

use lesson_admin::AppError;

#[test]
fn display_prefixes_identify_the_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Db("locked".into()), "db: locked"),
        (AppError::Platform("timeout".into()), "platform: timeout"),
        (AppError::Report("v2".into()), "report: v2"),
        (AppError::Validation("empty".into()), "validation: empty"),
        (AppError::NotFound("user u1".into()), "not found: user u1"),
        (AppError::Unauthorized("who".into()), "unauthorized: who"),
        (AppError::Forbidden("no".into()), "forbidden: no"),
        (AppError::Conflict("busy".into()), "conflict: busy"),
        (AppError::Io("eof".into()), "io: eof"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn json_errors_become_report_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{")
        .map_err(AppError::from)
        .expect_err("invalid json");
    assert!(matches!(err, AppError::Report(_)));
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= nope")
        .map_err(AppError::from)
        .expect_err("invalid toml");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn io_errors_become_io_errors() {
    let err = AppError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
    assert_eq!(err.to_string(), "io: gone");
}
