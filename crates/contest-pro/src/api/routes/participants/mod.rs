mod participant_routes;

pub use participant_routes::*;
