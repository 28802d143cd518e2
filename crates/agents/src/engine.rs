//! Next-best-action scoring for autonomous agents.
//!
//! Deterministic: every candidate action is simulated against the top
//! relevant prediction using the fixed tables in [`crate::tables`], then
//! ranked by expected net value.

use std::cmp::Ordering;

use tracing::debug;

use crate::boundaries::check_boundaries;
use crate::tables::{
    alignment, base_risk, base_success_probability, relevant_predictions, risk_multiplier,
    MAX_SUCCESS_PROBABILITY,
};
use crate::types::{
    ActionOutcome, Agent, AgentAction, AgentDecision, ContactContext, ContactProfile,
    DecisionExplanation, DecisionPayload, Prediction, PredictionType, RiskLevel,
};

const HIGH_URGENCY: f64 = 0.7;
const WAIT_HOURS: u32 = 48;

fn priority(prediction: &Prediction) -> f64 {
    prediction.confidence * (0.5 + prediction.urgency())
}

/// Highest-priority prediction among those relevant to the agent's objective
/// and confident enough to act on. Earlier predictions win ties.
fn top_prediction<'a>(agent: &Agent, predictions: &'a [Prediction]) -> Option<&'a Prediction> {
    let relevant = relevant_predictions(agent.objective);
    let mut best: Option<&Prediction> = None;
    for prediction in predictions.iter().filter(|p| {
        relevant.contains(&p.prediction_type) && p.confidence >= agent.confidence_threshold
    }) {
        if best.map_or(true, |b| priority(prediction) > priority(b)) {
            best = Some(prediction);
        }
    }
    best
}

fn profile_factors(profile: Option<&ContactProfile>) -> (f64, f64) {
    match profile {
        Some(p) => (
            1.15 - 0.3 * p.entropy.clamp(0.0, 1.0),
            0.85 + 0.3 * p.confidence_score.clamp(0.0, 1.0),
        ),
        None => (1.0, 1.0),
    }
}

fn simulate(
    agent: &Agent,
    action: AgentAction,
    prediction: &Prediction,
    profile: Option<&ContactProfile>,
) -> ActionOutcome {
    let (entropy_factor, profile_factor) = profile_factors(profile);
    let success_probability = (base_success_probability(action)
        * prediction.confidence
        * entropy_factor
        * profile_factor)
        .clamp(0.0, MAX_SUCCESS_PROBABILITY);
    let risk_score = base_risk(action) * risk_multiplier(prediction.risk_level);
    let reward_score = alignment(agent.objective, action) * (0.5 + prediction.urgency());
    let net_value =
        reward_score * success_probability - risk_score * (1.0 - success_probability);

    ActionOutcome {
        action,
        success_probability,
        risk_score,
        reward_score,
        net_value,
        confidence: 0.6 * prediction.confidence + 0.4 * success_probability,
    }
}

/// Simulate every allowed action against `prediction`, ranked by net value
/// (highest first). Duplicate actions are scored once.
pub fn simulate_actions(
    agent: &Agent,
    prediction: &Prediction,
    profile: Option<&ContactProfile>,
) -> Vec<ActionOutcome> {
    let mut seen: Vec<AgentAction> = Vec::with_capacity(agent.allowed_actions.len());
    let mut outcomes: Vec<ActionOutcome> = Vec::with_capacity(agent.allowed_actions.len());
    for &action in &agent.allowed_actions {
        if seen.contains(&action) {
            continue;
        }
        seen.push(action);
        outcomes.push(simulate(agent, action, prediction, profile));
    }
    outcomes.sort_by(|a, b| {
        b.net_value
            .partial_cmp(&a.net_value)
            .unwrap_or(Ordering::Equal)
    });
    outcomes
}

fn message_tone(prediction: &Prediction) -> &'static str {
    match prediction.prediction_type {
        PredictionType::ChurnRisk | PredictionType::SupportNeed => "empathetic",
        _ if prediction.urgency() >= HIGH_URGENCY => "urgent",
        _ => "friendly",
    }
}

fn stage_hint(prediction_type: PredictionType) -> &'static str {
    match prediction_type {
        PredictionType::PurchaseIntent => "ready_to_buy",
        PredictionType::ChurnRisk => "at_risk",
        PredictionType::UpsellOpportunity => "upsell",
        PredictionType::Reengagement => "reengaged",
        PredictionType::ObjectionLikely => "objection_handling",
        PredictionType::SupportNeed => "support",
    }
}

fn build_payload(agent: &Agent, action: AgentAction, prediction: &Prediction) -> DecisionPayload {
    let urgent = prediction.urgency() >= HIGH_URGENCY;
    let message = |channel: &str| DecisionPayload::Message {
        channel: channel.to_string(),
        template_hint: format!("{}_{}", agent.objective, prediction.prediction_type),
        tone: message_tone(prediction).to_string(),
    };
    match action {
        AgentAction::SendWhatsapp => message("whatsapp"),
        AgentAction::SendEmail => message("email"),
        AgentAction::OfferDiscount => DecisionPayload::Discount {
            percent: if urgent { 15 } else { 10 },
        },
        AgentAction::ScheduleFollowup => DecisionPayload::Followup {
            delay_hours: if urgent { 4 } else { 24 },
        },
        AgentAction::AddTag => DecisionPayload::Tag {
            tag: format!("agent:{}", prediction.prediction_type),
        },
        AgentAction::MoveStage => DecisionPayload::Stage {
            hint: stage_hint(prediction.prediction_type).to_string(),
        },
        AgentAction::NotifyHuman => DecisionPayload::Escalation {
            priority: if urgent || prediction.risk_level == RiskLevel::High {
                "high".to_string()
            } else {
                "normal".to_string()
            },
        },
        AgentAction::Wait => DecisionPayload::Wait { hours: WAIT_HOURS },
    }
}

fn build_explanation(
    agent: &Agent,
    outcome: &ActionOutcome,
    prediction: &Prediction,
    profile: Option<&ContactProfile>,
) -> DecisionExplanation {
    let mut factors = vec![
        format!(
            "{} prediction with {:.0}% confidence",
            prediction.prediction_type,
            prediction.confidence * 100.0
        ),
        format!("urgency {:.2}", prediction.urgency()),
        format!("{:?} risk level", prediction.risk_level).to_lowercase(),
        format!(
            "{} alignment {:.2} with {} objective",
            outcome.action,
            alignment(agent.objective, outcome.action),
            agent.objective
        ),
    ];
    if let Some(p) = profile {
        factors.push(format!(
            "profile entropy {:.2}, profile confidence {:.2}",
            p.entropy, p.confidence_score
        ));
    }
    if let Some(reason) = &prediction.explanation {
        factors.push(reason.clone());
    }

    let reasoning = format!(
        "Agent '{}' chose {} for its {} objective: {:.0}% estimated success, \
         risk {:.2}, expected net value {:.3}.",
        agent.name,
        outcome.action,
        agent.objective,
        outcome.success_probability * 100.0,
        outcome.risk_score,
        outcome.net_value
    );

    DecisionExplanation { factors, reasoning }
}

/// Decide the next action an agent should take for a contact, or `None`
/// when the agent is inactive, a boundary blocks it, no prediction is
/// relevant, or no action clears the confidence threshold.
pub fn evaluate(
    agent: &Agent,
    predictions: &[Prediction],
    context: &ContactContext,
) -> Option<AgentDecision> {
    if !agent.is_active {
        debug!(agent_id = %agent.id, "Agent inactive, skipping");
        return None;
    }
    if let Some(violation) = check_boundaries(&agent.boundaries, context) {
        debug!(
            agent_id = %agent.id,
            contact_id = %context.contact_id,
            ?violation,
            "Agent boundary blocked evaluation"
        );
        metrics::counter!("agents.boundary_blocked").increment(1);
        return None;
    }

    let prediction = top_prediction(agent, predictions)?;
    let profile = context.profile.as_ref();

    let mut ranked: Vec<ActionOutcome> = simulate_actions(agent, prediction, profile)
        .into_iter()
        .filter(|o| o.confidence >= agent.confidence_threshold)
        .collect();
    if ranked.is_empty() {
        debug!(agent_id = %agent.id, "No action cleared the confidence threshold");
        return None;
    }
    let best = ranked.remove(0);

    debug!(
        agent_id = %agent.id,
        contact_id = %context.contact_id,
        action = %best.action,
        net_value = best.net_value,
        "Agent decision"
    );
    metrics::counter!("agents.decisions", "action" => best.action.as_str()).increment(1);

    Some(AgentDecision {
        agent_id: agent.id,
        contact_id: context.contact_id.clone(),
        action: best.action,
        prediction_id: prediction.id,
        confidence: best.confidence,
        risk_score: best.risk_score,
        reward_score: best.reward_score,
        success_probability: best.success_probability,
        net_value: best.net_value,
        explanation: build_explanation(agent, &best, prediction, profile),
        payload: build_payload(agent, best.action, prediction),
        alternatives: ranked,
        decided_at: context.now,
    })
}
