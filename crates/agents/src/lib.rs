//! Autonomous agent decisioning — boundary gating plus table-driven scoring
//! of candidate next actions for a contact.

pub mod boundaries;
pub mod engine;
pub mod tables;
pub mod types;

pub use boundaries::{check_boundaries, BoundaryViolation};
pub use engine::{evaluate, simulate_actions};
pub use types::{Agent, AgentDecision, ContactContext, Prediction};
