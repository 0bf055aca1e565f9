pub mod contests;
pub mod organizer;
pub mod participations;
pub mod users;

pub use contests::*;
pub use organizer::*;
pub use participations::*;
pub use users::*;

use contest_pro_core::CoreError;
use thiserror::Error;

use crate::infra::{db::DatabaseWriteError, payments};

#[derive(Error, Debug)]
pub enum Error {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Please provide a valid query")]
    NoValidQuery,
    #[error("A winner has already been declared for this contest")]
    WinnerAlreadyDeclared,
    #[error("forbidden access")]
    Forbidden,
    #[error("problem querying db: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("db busy: {0}")]
    DbBusy(String),
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("payment failed: {0}")]
    Payment(#[from] payments::Error),
    #[error("failed to sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<DatabaseWriteError> for Error {
    fn from(value: DatabaseWriteError) -> Self {
        match value {
            DatabaseWriteError::Sqlx(e) => Error::DbError(e),
            e => Error::DbBusy(e.to_string()),
        }
    }
}

impl From<CoreError> for Error {
    fn from(value: CoreError) -> Self {
        Error::BadRequest(value.to_string())
    }
}

/// Drops client supplied keys that collide with server owned fields
pub(crate) fn strip_reserved(
    extra: &mut serde_json::Map<String, serde_json::Value>,
    reserved: &[&str],
) {
    for key in reserved {
        extra.remove(*key);
    }
}

/// Serializes the free-form fields kept next to a record, empty maps are stored as NULL
pub(crate) fn encode_extra(
    extra: &serde_json::Map<String, serde_json::Value>,
) -> Result<Option<String>, serde_json::Error> {
    if extra.is_empty() {
        Ok(None)
    } else {
        serde_json::to_string(extra).map(Some)
    }
}
