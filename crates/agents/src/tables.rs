//! Fixed heuristic tables behind the decision engine.

use crate::types::{AgentAction, AgentObjective, PredictionType, RiskLevel};

pub const MAX_SUCCESS_PROBABILITY: f64 = 0.95;

pub fn base_success_probability(action: AgentAction) -> f64 {
    match action {
        AgentAction::SendWhatsapp => 0.35,
        AgentAction::SendEmail => 0.20,
        AgentAction::OfferDiscount => 0.45,
        AgentAction::ScheduleFollowup => 0.30,
        AgentAction::AddTag => 0.90,
        AgentAction::MoveStage => 0.85,
        AgentAction::NotifyHuman => 0.60,
        AgentAction::Wait => 0.95,
    }
}

pub fn base_risk(action: AgentAction) -> f64 {
    match action {
        AgentAction::SendWhatsapp => 0.25,
        AgentAction::SendEmail => 0.10,
        AgentAction::OfferDiscount => 0.40,
        AgentAction::ScheduleFollowup => 0.15,
        AgentAction::AddTag => 0.05,
        AgentAction::MoveStage => 0.10,
        AgentAction::NotifyHuman => 0.20,
        AgentAction::Wait => 0.05,
    }
}

pub fn risk_multiplier(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::High => 1.5,
        RiskLevel::Medium => 1.0,
        RiskLevel::Low => 0.7,
    }
}

/// Prediction types an objective reacts to.
pub fn relevant_predictions(objective: AgentObjective) -> &'static [PredictionType] {
    use PredictionType::*;
    match objective {
        AgentObjective::Sales => &[PurchaseIntent, ObjectionLikely],
        AgentObjective::Upsell => &[UpsellOpportunity, PurchaseIntent],
        AgentObjective::Retention => &[ChurnRisk, SupportNeed],
        AgentObjective::Reactivation => &[Reengagement, ChurnRisk],
        AgentObjective::Nurturing => &[Reengagement, PurchaseIntent, ObjectionLikely],
        AgentObjective::Support => &[SupportNeed, ChurnRisk],
    }
}

/// Reward multiplier for taking `action` in pursuit of `objective`.
pub fn alignment(objective: AgentObjective, action: AgentAction) -> f64 {
    use AgentAction::*;
    match objective {
        AgentObjective::Sales => match action {
            SendWhatsapp => 1.2,
            SendEmail => 0.9,
            OfferDiscount => 1.3,
            ScheduleFollowup => 1.0,
            AddTag => 0.4,
            MoveStage => 0.7,
            NotifyHuman => 1.1,
            Wait => 0.2,
        },
        AgentObjective::Upsell => match action {
            SendWhatsapp => 1.1,
            SendEmail => 1.0,
            OfferDiscount => 1.2,
            ScheduleFollowup => 0.8,
            AddTag => 0.4,
            MoveStage => 0.6,
            NotifyHuman => 0.9,
            Wait => 0.2,
        },
        AgentObjective::Retention => match action {
            SendWhatsapp => 1.0,
            SendEmail => 0.9,
            OfferDiscount => 1.1,
            ScheduleFollowup => 1.0,
            AddTag => 0.5,
            MoveStage => 0.6,
            NotifyHuman => 1.3,
            Wait => 0.3,
        },
        AgentObjective::Reactivation => match action {
            SendWhatsapp => 1.2,
            SendEmail => 1.1,
            OfferDiscount => 1.0,
            ScheduleFollowup => 0.9,
            AddTag => 0.5,
            MoveStage => 0.5,
            NotifyHuman => 0.8,
            Wait => 0.3,
        },
        AgentObjective::Nurturing => match action {
            SendWhatsapp => 1.0,
            SendEmail => 1.2,
            OfferDiscount => 0.5,
            ScheduleFollowup => 1.1,
            AddTag => 0.7,
            MoveStage => 0.8,
            NotifyHuman => 0.6,
            Wait => 0.6,
        },
        AgentObjective::Support => match action {
            SendWhatsapp => 0.9,
            SendEmail => 0.8,
            OfferDiscount => 0.3,
            ScheduleFollowup => 1.0,
            AddTag => 0.5,
            MoveStage => 0.6,
            NotifyHuman => 1.4,
            Wait => 0.3,
        },
    }
}
