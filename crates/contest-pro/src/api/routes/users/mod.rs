mod user_routes;

pub use user_routes::*;
