pub mod config;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod types;

pub use config::AppConfig;
pub use error::{CuboError, CuboResult};
pub use lookup::OfferLookup;
