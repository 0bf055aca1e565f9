mod filter;
mod store;

pub use filter::*;
pub use store::*;
