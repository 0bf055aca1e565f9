mod auth;
mod health_check;

pub use auth::*;
pub use health_check::*;
