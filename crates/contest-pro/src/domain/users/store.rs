use contest_pro_core::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    domain::{encode_extra, strip_reserved, Error},
    infra::db::{
        format_datetime, parse_json_object, parse_required_datetime, parse_uuid, DBConnection,
    },
};

const USER_COLUMNS: &str = "id, email, name, image, role, extra, created_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: parse_uuid(row, "id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            image: row.try_get("image")?,
            role: role.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: String::from("role"),
                source: Box::new(e),
            })?,
            created_at: parse_required_datetime(row, "created_at")?,
            extra: parse_json_object(row, "extra")?,
        })
    }
}

/// Sign-up payload, anything besides the known profile fields is kept as-is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Projection returned by the role lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct UserStore {
    db_connection: DBConnection,
}

impl UserStore {
    pub fn new(db_connection: DBConnection) -> Self {
        Self { db_connection }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.db_connection.ping().await
    }

    /// Inserts the user unless the email is already registered, returns the new id when a row was written
    pub async fn insert_if_absent(&self, user: NewUser) -> Result<Option<Uuid>, Error> {
        let id = Uuid::now_v7();
        let created_at = format_datetime(OffsetDateTime::now_utc())?;
        let mut extra = user.extra;
        strip_reserved(
            &mut extra,
            &["_id", "id", "role", "created_at", "email", "name", "image"],
        );
        let extra = encode_extra(&extra)?;

        let rows_affected = self
            .db_connection
            .execute_write(move |pool| async move {
                let result = sqlx::query(
                    "INSERT INTO users (id, email, name, image, role, extra, created_at)
                     VALUES (?, ?, ?, ?, 'user', ?, ?)
                     ON CONFLICT(email) DO NOTHING",
                )
                .bind(id.to_string())
                .bind(user.email)
                .bind(user.name)
                .bind(user.image)
                .bind(extra)
                .bind(created_at)
                .execute(&pool)
                .await?;
                Ok(result.rows_affected())
            })
            .await?;

        Ok((rows_affected > 0).then_some(id))
    }

    pub async fn list(&self) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY rowid",
            USER_COLUMNS
        ))
        .fetch_all(self.db_connection.read())
        .await?;
        Ok(users)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.db_connection.read())
        .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, Error> {
        let rows_affected = self
            .db_connection
            .execute_write(move |pool| async move {
                let result = sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id.to_string())
                    .execute(&pool)
                    .await?;
                Ok(result.rows_affected())
            })
            .await?;
        Ok(rows_affected)
    }

    /// Returns (matched, modified), setting a user to the role they already hold matches without modifying
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<(u64, u64), Error> {
        let counts = self
            .db_connection
            .execute_write(move |pool| async move {
                let matched: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
                    .bind(id.to_string())
                    .fetch_one(&pool)
                    .await?;
                let modified = sqlx::query("UPDATE users SET role = ? WHERE id = ? AND role != ?")
                    .bind(role.as_str())
                    .bind(id.to_string())
                    .bind(role.as_str())
                    .execute(&pool)
                    .await?
                    .rows_affected();
                Ok((matched as u64, modified))
            })
            .await?;
        Ok(counts)
    }
}
