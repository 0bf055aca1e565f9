mod contests;
mod home;
mod participants;
mod payments;
mod system;
mod users;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use hyper::StatusCode;
use log::error;
use serde_json::json;

use crate::domain::Error;

pub use contests::*;
pub use home::*;
pub use participants::*;
pub use payments::*;
pub use system::*;
pub use users::*;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            Error::BadRequest(_) | Error::NoValidQuery => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            Error::WinnerAlreadyDeclared => (
                StatusCode::BAD_REQUEST,
                json!({ "message": self.to_string() }),
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "message": "forbidden access" }),
            ),
            Error::Payment(_) => (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() })),
            _ => {
                error!("internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
