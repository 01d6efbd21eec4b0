//! User profile, email, and school repository for `SQLite` persistence.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::user::{Role, School, UserProfile};
use crate::models::{Page, PageRequest};
use crate::{AppError, Result};

use super::db::Database;
use super::{parse_opt_ts, parse_ts};

/// Sort orders accepted by the user list.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    /// Newest accounts first.
    #[default]
    CreatedDesc,
    /// Oldest accounts first.
    CreatedAsc,
    /// Display name A-Z.
    NameAsc,
    /// Display name Z-A.
    NameDesc,
    /// Most recent sign-in first; never-signed-in last.
    LastSignInDesc,
}

impl UserSort {
    fn order_by(self) -> &'static str {
        match self {
            Self::CreatedDesc => " ORDER BY created_at DESC, id",
            Self::CreatedAsc => " ORDER BY created_at ASC, id",
            Self::NameAsc => " ORDER BY display_name COLLATE NOCASE ASC, id",
            Self::NameDesc => " ORDER BY display_name COLLATE NOCASE DESC, id",
            Self::LastSignInDesc => {
                " ORDER BY last_sign_in_at IS NULL, last_sign_in_at DESC, id"
            }
        }
    }
}

/// Filter constraints for the user list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive substring of the display name.
    pub search: Option<String>,
    /// Exact role.
    pub role: Option<Role>,
    /// Active flag.
    pub active: Option<bool>,
    /// Exact school.
    pub school_id: Option<String>,
}

impl UserFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND display_name LIKE ")
                .push_bind(format!("%{search}%"));
        }
        if let Some(role) = self.role {
            qb.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(active) = self.active {
            qb.push(" AND is_active = ").push_bind(active);
        }
        if let Some(school_id) = self.school_id.clone() {
            qb.push(" AND school_id = ").push_bind(school_id);
        }
    }
}

/// Partial update applied by the user detail form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UserUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New school; `Some(None)` is not representable, use an empty string to clear.
    pub school_id: Option<String>,
}

/// Repository wrapper around `SQLite` for user records.
#[derive(Clone)]
pub struct UserRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    display_name: String,
    role: String,
    school_id: Option<String>,
    is_active: bool,
    created_at: String,
    last_sign_in_at: Option<String>,
}

impl UserRow {
    fn into_user(self) -> Result<UserProfile> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| AppError::Db(format!("invalid role: {}", self.role)))?;
        Ok(UserProfile {
            id: self.id,
            display_name: self.display_name,
            role,
            school_id: self.school_id,
            is_active: self.is_active,
            created_at: parse_ts("created_at", &self.created_at)?,
            last_sign_in_at: parse_opt_ts("last_sign_in_at", self.last_sign_in_at.as_deref())?,
        })
    }
}

impl UserRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a user profile and, when given, its email address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails (including a duplicate email).
    pub async fn create(&self, user: &UserProfile, email: Option<&str>) -> Result<UserProfile> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO user_profile (id, display_name, role, school_id, is_active,
             created_at, last_sign_in_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.id)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.school_id)
        .bind(user.is_active)
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_sign_in_at.map(|dt| dt.to_rfc3339()))
        .execute(&mut *tx)
        .await?;

        if let Some(email) = email {
            sqlx::query("INSERT INTO user_email (user_id, email) VALUES (?1, ?2)")
                .bind(&user.id)
                .bind(email.to_lowercase())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(user.clone())
    }

    /// Retrieve a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserProfile>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user_profile WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// List one page of users matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if either query fails.
    pub async fn list(
        &self,
        filter: &UserFilter,
        sort: UserSort,
        page: PageRequest,
    ) -> Result<Page<UserProfile>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM user_profile");
        filter.push_where(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.db.as_ref())
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM user_profile");
        filter.push_where(&mut qb);
        qb.push(sort.order_by());
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());
        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(self.db.as_ref()).await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(UserRow::into_user)
                .collect::<Result<_>>()?,
            total: u64::try_from(total).unwrap_or_default(),
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// List every user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<UserProfile>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM user_profile ORDER BY created_at")
            .fetch_all(self.db.as_ref())
            .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Apply a partial update. Returns `false` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<bool> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE user_profile SET id = id");
        if let Some(name) = update.display_name.as_deref() {
            qb.push(", display_name = ").push_bind(name.trim().to_owned());
        }
        if let Some(role) = update.role {
            qb.push(", role = ").push_bind(role.as_str());
        }
        if let Some(school_id) = update.school_id.as_deref() {
            let school = Some(school_id.trim().to_owned()).filter(|s| !s.is_empty());
            qb.push(", school_id = ").push_bind(school);
        }
        qb.push(" WHERE id = ").push_bind(id.to_owned());

        let result = qb.build().execute(self.db.as_ref()).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the active flag. Returns `false` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE user_profile SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user and its email row. Returns `false` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM user_email WHERE user_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM user_profile WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any account already uses `email`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_email WHERE email = ?1")
            .bind(email.to_lowercase())
            .fetch_one(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    /// Email addresses for the given users, keyed by user id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn emails_for(&self, user_ids: &[String]) -> Result<HashMap<String, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT user_id, email FROM user_email WHERE user_id IN (");
        let mut separated = qb.separated(", ");
        for id in user_ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(self.db.as_ref()).await?;
        Ok(rows.into_iter().collect())
    }

    /// Insert or rename a school.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the upsert fails.
    pub async fn upsert_school(&self, school: &School) -> Result<()> {
        sqlx::query(
            "INSERT INTO school (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(&school.id)
        .bind(&school.name)
        .execute(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// School names for the given school ids, keyed by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn school_names_for(&self, school_ids: &[String]) -> Result<HashMap<String, String>> {
        if school_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, name FROM school WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in school_ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(self.db.as_ref()).await?;
        Ok(rows.into_iter().collect())
    }
}
