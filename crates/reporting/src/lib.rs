//! Sales analytics and reporting — dashboard breakdowns, acquisition cohorts,
//! UTM attribution, hierarchical UTM drilldown and offer/funnel integrity.

pub mod attribution;
pub mod breakdown;
pub mod cohort;
pub mod drilldown;
pub mod integrity;

pub use attribution::attribute_by_utm;
pub use breakdown::{compute_breakdown, compute_breakdowns};
pub use cohort::analyze_cohorts;
pub use drilldown::UtmDrilldown;
pub use integrity::integrity_report;
