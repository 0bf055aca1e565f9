use contest_pro_core::string_or_number;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Row, Sqlite};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ContestFilter, PendingFilter, TypeFilter};
use crate::{
    domain::{encode_extra, strip_reserved, Error},
    infra::db::{
        format_datetime, parse_json_object, parse_required_datetime, parse_uuid, DBConnection,
    },
};

const CONTEST_COLUMNS: &str = "id, title, image, description, price, prize, contest_type, \
    task_instruction, deadline, creator_email, creator_name, creator_image, is_pending, extra, \
    created_at";

const RESERVED_CONTEST_KEYS: [&str; 14] = [
    "_id",
    "id",
    "title",
    "image",
    "description",
    "price",
    "prize",
    "contestType",
    "taskInstruction",
    "deadline",
    "creator",
    "isPending",
    "createdAt",
    "created_at",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    /// Entry fee in major currency units
    pub price: f64,
    pub prize: String,
    pub contest_type: String,
    pub task_instruction: Option<String>,
    pub deadline: Option<String>,
    pub creator: Creator,
    pub is_pending: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FromRow<'_, SqliteRow> for Contest {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Contest {
            id: parse_uuid(row, "id")?,
            title: row.try_get("title")?,
            image: row.try_get("image")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            prize: row.try_get("prize")?,
            contest_type: row.try_get("contest_type")?,
            task_instruction: row.try_get("task_instruction")?,
            deadline: row.try_get("deadline")?,
            creator: Creator {
                email: row.try_get("creator_email")?,
                name: row.try_get("creator_name")?,
                image: row.try_get("creator_image")?,
            },
            is_pending: row.try_get("is_pending")?,
            created_at: parse_required_datetime(row, "created_at")?,
            extra: parse_json_object(row, "extra")?,
        })
    }
}

/// Contest as submitted by its creator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContest {
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub prize: String,
    #[serde(default)]
    pub contest_type: String,
    #[serde(default)]
    pub task_instruction: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contest {
    /// New contests always wait for an admin's approval
    pub fn pending(new_contest: NewContest, creator: Creator) -> Self {
        let mut extra = new_contest.extra;
        strip_reserved(&mut extra, &RESERVED_CONTEST_KEYS);
        Self {
            id: Uuid::now_v7(),
            title: new_contest.title,
            image: new_contest.image,
            description: new_contest.description,
            price: new_contest.price,
            prize: new_contest.prize,
            contest_type: new_contest.contest_type,
            task_instruction: new_contest.task_instruction,
            deadline: new_contest.deadline,
            creator,
            is_pending: true,
            created_at: OffsetDateTime::now_utc(),
            extra,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContestStore {
    db_connection: DBConnection,
}

impl ContestStore {
    pub fn new(db_connection: DBConnection) -> Self {
        Self { db_connection }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.db_connection.ping().await
    }

    pub async fn insert(&self, contest: Contest) -> Result<Uuid, Error> {
        let id = contest.id;
        let created_at = format_datetime(contest.created_at)?;
        let extra = encode_extra(&contest.extra)?;

        self.db_connection
            .execute_write(move |pool| async move {
                sqlx::query(
                    "INSERT INTO contests (
                        id,
                        title,
                        image,
                        description,
                        price,
                        prize,
                        contest_type,
                        task_instruction,
                        deadline,
                        creator_email,
                        creator_name,
                        creator_image,
                        is_pending,
                        extra,
                        created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(contest.id.to_string())
                .bind(contest.title)
                .bind(contest.image)
                .bind(contest.description)
                .bind(contest.price)
                .bind(contest.prize)
                .bind(contest.contest_type)
                .bind(contest.task_instruction)
                .bind(contest.deadline)
                .bind(contest.creator.email)
                .bind(contest.creator.name)
                .bind(contest.creator.image)
                .bind(contest.is_pending)
                .bind(extra)
                .bind(created_at)
                .execute(&pool)
                .await
            })
            .await?;

        Ok(id)
    }

    pub async fn list(&self, filter: &ContestFilter) -> Result<Vec<Contest>, Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM contests WHERE 1 = 1",
            CONTEST_COLUMNS
        ));

        if let PendingFilter::Only(is_pending) = filter.pending {
            builder.push(" AND is_pending = ").push_bind(is_pending);
        }

        if let Some(email) = &filter.creator_email {
            builder.push(" AND creator_email = ").push_bind(email.clone());
        }

        match &filter.contest_type {
            TypeFilter::Any => {}
            TypeFilter::Exactly(kind) => {
                builder.push(" AND contest_type = ").push_bind(kind.clone());
            }
            TypeFilter::NotIn(kinds) if kinds.is_empty() => {}
            TypeFilter::NotIn(kinds) => {
                builder.push(" AND contest_type NOT IN (");
                let mut separated = builder.separated(", ");
                for kind in kinds {
                    separated.push_bind(kind.clone());
                }
                separated.push_unseparated(")");
            }
        }

        builder.push(" ORDER BY rowid");

        let contests = builder
            .build_query_as::<Contest>()
            .fetch_all(self.db_connection.read())
            .await?;
        Ok(contests)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Contest>, Error> {
        let contest = sqlx::query_as::<_, Contest>(&format!(
            "SELECT {} FROM contests WHERE id = ?",
            CONTEST_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.db_connection.read())
        .await?;
        Ok(contest)
    }

    /// Flips a pending contest to approved, returns false when nothing was pending under that id
    pub async fn approve(&self, id: Uuid) -> Result<bool, Error> {
        let rows_affected = self
            .db_connection
            .execute_write(move |pool| async move {
                let result =
                    sqlx::query("UPDATE contests SET is_pending = 0 WHERE id = ? AND is_pending = 1")
                        .bind(id.to_string())
                        .execute(&pool)
                        .await?;
                Ok(result.rows_affected())
            })
            .await?;
        Ok(rows_affected > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, Error> {
        let rows_affected = self
            .db_connection
            .execute_write(move |pool| async move {
                let result = sqlx::query("DELETE FROM contests WHERE id = ?")
                    .bind(id.to_string())
                    .execute(&pool)
                    .await?;
                Ok(result.rows_affected())
            })
            .await?;
        Ok(rows_affected)
    }
}
