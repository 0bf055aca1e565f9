pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod startup;

pub use api::routes::*;
pub use config::*;
pub use domain::{
    Caller, Contest, ContestFilter, ContestStore, Error as ContestProError, Organizer,
    Participation, ParticipationQuery, ParticipationStore, User, UserInfo, UserStore,
};
pub use infra::db::*;
pub use infra::file_utils::*;
pub use infra::payments::{
    Error as PaymentError, PaymentGateway, PaymentIntent, PaymentIntentRequest, StripeClient,
};
pub use infra::tokens::{Claims, TokenIssuer};
pub use startup::*;
