mod query;
mod store;

pub use query::*;
pub use store::*;
