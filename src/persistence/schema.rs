//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` and are safe to
//! re-run on every server startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS school (
    id              TEXT PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profile (
    id              TEXT PRIMARY KEY NOT NULL,
    display_name    TEXT NOT NULL,
    role            TEXT NOT NULL CHECK(role IN ('admin','reviewer','teacher')),
    school_id       TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    last_sign_in_at TEXT
);

CREATE TABLE IF NOT EXISTS user_email (
    user_id         TEXT PRIMARY KEY NOT NULL,
    email           TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS invitation (
    id              TEXT PRIMARY KEY NOT NULL,
    email           TEXT NOT NULL,
    role            TEXT NOT NULL CHECK(role IN ('admin','reviewer','teacher')),
    school_id       TEXT,
    invited_by      TEXT NOT NULL,
    token_hash      TEXT NOT NULL UNIQUE,
    status          TEXT NOT NULL CHECK(status IN ('pending','accepted','revoked','expired')),
    created_at      TEXT NOT NULL,
    expires_at      TEXT NOT NULL,
    accepted_at     TEXT
);

CREATE TABLE IF NOT EXISTS submission (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    summary         TEXT,
    content_url     TEXT,
    submitted_by    TEXT NOT NULL,
    status          TEXT NOT NULL
                    CHECK(status IN ('pending','approved','rejected','needs_revision')),
    subjects        TEXT NOT NULL DEFAULT '[]',
    grade_levels    TEXT NOT NULL DEFAULT '[]',
    reviewer_notes  TEXT,
    reviewed_by     TEXT,
    reviewed_at     TEXT,
    lesson_id       TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lesson (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    summary         TEXT,
    subjects        TEXT NOT NULL DEFAULT '[]',
    grade_levels    TEXT NOT NULL DEFAULT '[]',
    source_submission_id TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS duplicate_resolution (
    id              TEXT PRIMARY KEY NOT NULL,
    group_id        TEXT NOT NULL,
    kind            TEXT NOT NULL CHECK(kind IN ('resolved','dismissed')),
    reviewer_id     TEXT NOT NULL,
    kept_count      INTEGER NOT NULL DEFAULT 0,
    archived_count  INTEGER NOT NULL DEFAULT 0,
    reason          TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_role ON user_profile(role);
CREATE INDEX IF NOT EXISTS idx_invitation_email ON invitation(email);
CREATE INDEX IF NOT EXISTS idx_invitation_status ON invitation(status);
CREATE INDEX IF NOT EXISTS idx_submission_status ON submission(status);
CREATE INDEX IF NOT EXISTS idx_resolution_group ON duplicate_resolution(group_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
