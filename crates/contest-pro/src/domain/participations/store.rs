use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    domain::{encode_extra, strip_reserved, Contest, Error},
    infra::db::{
        format_datetime, parse_json_object, parse_required_datetime, parse_uuid, DBConnection,
        DatabaseWriteError,
    },
};

const PARTICIPATION_COLUMNS: &str = "id, contest_id, contest_title, contest_prize, creator_email, \
    participant_email, participant_name, transaction_id, submission, is_winner, extra, created_at";

const RESERVED_PARTICIPATION_KEYS: [&str; 13] = [
    "_id",
    "id",
    "contest_id",
    "contest_title",
    "contest_prize",
    "creator_email",
    "participant_email",
    "participant_name",
    "transaction_id",
    "submission",
    "isWinner",
    "is_winner",
    "created_at",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub contest_id: Option<String>,
    pub contest_title: String,
    pub contest_prize: String,
    pub creator_email: String,
    pub participant_email: String,
    pub participant_name: Option<String>,
    pub transaction_id: String,
    pub submission: Option<String>,
    #[serde(rename = "isWinner")]
    pub is_winner: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FromRow<'_, SqliteRow> for Participation {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Participation {
            id: parse_uuid(row, "id")?,
            contest_id: row.try_get("contest_id")?,
            contest_title: row.try_get("contest_title")?,
            contest_prize: row.try_get("contest_prize")?,
            creator_email: row.try_get("creator_email")?,
            participant_email: row.try_get("participant_email")?,
            participant_name: row.try_get("participant_name")?,
            transaction_id: row.try_get("transaction_id")?,
            submission: row.try_get("submission")?,
            is_winner: row.try_get("is_winner")?,
            created_at: parse_required_datetime(row, "created_at")?,
            extra: parse_json_object(row, "extra")?,
        })
    }
}

/// Entry submitted after the participant paid the contest fee. Contest title, prize and creator
/// sent alongside are not trusted, they are copied from the stored contest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipation {
    pub contest_id: String,
    #[serde(default)]
    pub participant_name: Option<String>,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub submission: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Participation {
    /// Entries start as non-winners, the participant is whoever holds the token
    pub fn entry(
        new_participation: NewParticipation,
        contest: &Contest,
        participant_email: String,
    ) -> Self {
        let mut extra = new_participation.extra;
        strip_reserved(&mut extra, &RESERVED_PARTICIPATION_KEYS);
        Self {
            id: Uuid::now_v7(),
            contest_id: Some(contest.id.to_string()),
            contest_title: contest.title.clone(),
            contest_prize: contest.prize.clone(),
            creator_email: contest.creator.email.clone(),
            participant_email,
            participant_name: new_participation.participant_name,
            transaction_id: new_participation.transaction_id,
            submission: new_participation.submission,
            is_winner: false,
            created_at: OffsetDateTime::now_utc(),
            extra,
        }
    }
}

/// First entry seen for one of a creator's contests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestSummary {
    /// Grouping key, the contest title
    #[serde(rename = "_id")]
    pub group: String,
    pub contest_title: String,
    pub contest_prize: String,
    pub transaction_id: String,
}

impl FromRow<'_, SqliteRow> for ContestSummary {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let contest_title: String = row.try_get("contest_title")?;
        Ok(ContestSummary {
            group: contest_title.clone(),
            contest_title,
            contest_prize: row.try_get("contest_prize")?,
            transaction_id: row.try_get("transaction_id")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ParticipationStore {
    db_connection: DBConnection,
}

impl ParticipationStore {
    pub fn new(db_connection: DBConnection) -> Self {
        Self { db_connection }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.db_connection.ping().await
    }

    pub async fn insert(&self, participation: Participation) -> Result<Uuid, Error> {
        let id = participation.id;
        let created_at = format_datetime(participation.created_at)?;
        let extra = encode_extra(&participation.extra)?;

        self.db_connection
            .execute_write(move |pool| async move {
                sqlx::query(
                    "INSERT INTO participations (
                        id,
                        contest_id,
                        contest_title,
                        contest_prize,
                        creator_email,
                        participant_email,
                        participant_name,
                        transaction_id,
                        submission,
                        is_winner,
                        extra,
                        created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(participation.id.to_string())
                .bind(participation.contest_id)
                .bind(participation.contest_title)
                .bind(participation.contest_prize)
                .bind(participation.creator_email)
                .bind(participation.participant_email)
                .bind(participation.participant_name)
                .bind(participation.transaction_id)
                .bind(participation.submission)
                .bind(participation.is_winner)
                .bind(extra)
                .bind(created_at)
                .execute(&pool)
                .await
            })
            .await?;

        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Participation>, Error> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {} FROM participations WHERE id = ?",
            PARTICIPATION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.db_connection.read())
        .await?;
        Ok(participation)
    }

    pub async fn list_all(&self) -> Result<Vec<Participation>, Error> {
        let participations = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {} FROM participations ORDER BY rowid",
            PARTICIPATION_COLUMNS
        ))
        .fetch_all(self.db_connection.read())
        .await?;
        Ok(participations)
    }

    pub async fn list_by_participant(
        &self,
        email: &str,
        winners_only: bool,
    ) -> Result<Vec<Participation>, Error> {
        let winner_clause = if winners_only {
            " AND is_winner = 1"
        } else {
            ""
        };
        let participations = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {} FROM participations WHERE participant_email = ?{} ORDER BY rowid",
            PARTICIPATION_COLUMNS, winner_clause
        ))
        .bind(email)
        .fetch_all(self.db_connection.read())
        .await?;
        Ok(participations)
    }

    /// Groups a creator's entries by contest title, keeping the earliest stored row of each group
    pub async fn summaries_by_creator(&self, email: &str) -> Result<Vec<ContestSummary>, Error> {
        let summaries = sqlx::query_as::<_, ContestSummary>(
            "SELECT p.contest_title, p.contest_prize, p.transaction_id
             FROM participations p
             JOIN (
                SELECT MIN(rowid) AS first_row
                FROM participations
                WHERE creator_email = ?
                GROUP BY contest_title
             ) firsts ON p.rowid = firsts.first_row
             ORDER BY p.rowid",
        )
        .bind(email)
        .fetch_all(self.db_connection.read())
        .await?;
        Ok(summaries)
    }

    /// Marks the entry as winner unless its contest title already has one.
    /// Returns false, without writing anything, when a winner exists.
    pub async fn mark_winner(&self, id: Uuid) -> Result<bool, Error> {
        let result = self
            .db_connection
            .execute_write(move |pool| async move {
                let result = sqlx::query(
                    "UPDATE participations
                     SET is_winner = 1
                     WHERE id = ?
                       AND NOT EXISTS (
                         SELECT 1 FROM participations AS winner
                         WHERE winner.contest_title = participations.contest_title
                           AND winner.is_winner = 1
                       )",
                )
                .bind(id.to_string())
                .execute(&pool)
                .await?;
                Ok(result.rows_affected())
            })
            .await;

        match result {
            Ok(rows_affected) => Ok(rows_affected > 0),
            Err(DatabaseWriteError::Sqlx(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
