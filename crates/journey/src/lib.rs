//! Customer journey aggregation — groups sales by buyer, orders them in time,
//! and derives entry/target cohorts, purchase sequences and product flows.

pub mod aggregator;
pub mod cache;
pub mod flows;
pub mod types;

pub use aggregator::aggregate_journeys;
pub use cache::JourneyCache;
pub use flows::{product_flows, summarize};
