//! Agent, prediction and decision types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentObjective {
    Sales,
    Upsell,
    Retention,
    Reactivation,
    Nurturing,
    Support,
}

impl AgentObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentObjective::Sales => "sales",
            AgentObjective::Upsell => "upsell",
            AgentObjective::Retention => "retention",
            AgentObjective::Reactivation => "reactivation",
            AgentObjective::Nurturing => "nurturing",
            AgentObjective::Support => "support",
        }
    }
}

impl fmt::Display for AgentObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    SendWhatsapp,
    SendEmail,
    OfferDiscount,
    ScheduleFollowup,
    AddTag,
    MoveStage,
    NotifyHuman,
    Wait,
}

impl AgentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentAction::SendWhatsapp => "send_whatsapp",
            AgentAction::SendEmail => "send_email",
            AgentAction::OfferDiscount => "offer_discount",
            AgentAction::ScheduleFollowup => "schedule_followup",
            AgentAction::AddTag => "add_tag",
            AgentAction::MoveStage => "move_stage",
            AgentAction::NotifyHuman => "notify_human",
            AgentAction::Wait => "wait",
        }
    }
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    PurchaseIntent,
    ChurnRisk,
    UpsellOpportunity,
    Reengagement,
    ObjectionLikely,
    SupportNeed,
}

impl PredictionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionType::PurchaseIntent => "purchase_intent",
            PredictionType::ChurnRisk => "churn_risk",
            PredictionType::UpsellOpportunity => "upsell_opportunity",
            PredictionType::Reengagement => "reengagement",
            PredictionType::ObjectionLikely => "objection_likely",
            PredictionType::SupportNeed => "support_need",
        }
    }
}

impl fmt::Display for PredictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub prediction_type: PredictionType,
    pub confidence: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub urgency_score: f64,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Prediction {
    pub fn urgency(&self) -> f64 {
        self.urgency_score.clamp(0.0, 1.0)
    }
}

/// Local hour window `[start_hour, end_hour)`; `start_hour > end_hour`
/// wraps past midnight, equal hours mean no restriction. Hours are 0..=23.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(deserialize_with = "hour_of_day")]
    pub start_hour: u32,
    #[serde(deserialize_with = "hour_of_day")]
    pub end_hour: u32,
    #[serde(default)]
    pub exclude_weekends: bool,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn hour_of_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let hour = u32::deserialize(deserializer)?;
    if hour < 24 {
        Ok(hour)
    } else {
        Err(de::Error::custom(format!("hour {} is outside 0..=23", hour)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentBoundaries {
    pub working_hours: Option<WorkingHours>,
    pub excluded_tags: Vec<String>,
    pub required_tags: Vec<String>,
    pub max_daily_actions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub objective: AgentObjective,
    pub allowed_actions: Vec<AgentAction>,
    #[serde(default)]
    pub boundaries: AgentBoundaries,
    pub confidence_threshold: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    /// Behavioral unpredictability in [0, 1].
    pub entropy: f64,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactContext {
    pub contact_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub profile: Option<ContactProfile>,
    #[serde(default)]
    pub actions_today: u32,
    pub now: DateTime<Utc>,
}

/// Simulated result of one candidate action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: AgentAction,
    pub success_probability: f64,
    pub risk_score: f64,
    pub reward_score: f64,
    pub net_value: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionPayload {
    Message {
        channel: String,
        template_hint: String,
        tone: String,
    },
    Discount {
        percent: u32,
    },
    Followup {
        delay_hours: u32,
    },
    Tag {
        tag: String,
    },
    Stage {
        hint: String,
    },
    Escalation {
        priority: String,
    },
    Wait {
        hours: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionExplanation {
    pub factors: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDecision {
    pub agent_id: Uuid,
    pub contact_id: String,
    pub action: AgentAction,
    pub prediction_id: Uuid,
    pub confidence: f64,
    pub risk_score: f64,
    pub reward_score: f64,
    pub success_probability: f64,
    pub net_value: f64,
    pub explanation: DecisionExplanation,
    pub payload: DecisionPayload,
    pub alternatives: Vec<ActionOutcome>,
    pub decided_at: DateTime<Utc>,
}
