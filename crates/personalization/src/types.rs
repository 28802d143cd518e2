//! Inputs and output of the message personalization directive.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Friendly,
    Professional,
    Empathetic,
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    Benefits,
    SocialProof,
    CallToAction,
    TechnicalDetails,
    CaseStudy,
    PriceComparison,
    PersonalStory,
    Testimonial,
    Faq,
    Guarantee,
    Scarcity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaStyle {
    Soft,
    Direct,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Whatsapp,
    Email,
    Sms,
    Instagram,
    Web,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Minimal,
    #[default]
    Standard,
    Deep,
}

impl Depth {
    pub fn max_blocks(&self) -> Option<usize> {
        match self {
            Depth::Minimal => Some(2),
            Depth::Standard => Some(4),
            Depth::Deep => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Analytical,
    Emotional,
    Pragmatic,
    Social,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Buy,
    Research,
    Compare,
    Support,
    Churn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSignals {
    pub dominant_trait: Option<PersonalityTrait>,
    pub dominant_intent: Option<Intent>,
}

impl ProfileSignals {
    pub fn is_empty(&self) -> bool {
        self.dominant_trait.is_none() && self.dominant_intent.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySignals {
    pub pain_points: Vec<String>,
    pub objections: Vec<String>,
    pub fears: Vec<String>,
}

impl MemorySignals {
    pub fn is_empty(&self) -> bool {
        self.pain_points.is_empty() && self.objections.is_empty() && self.fears.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionSignals {
    pub urgency_score: f64,
    pub purchase_probability: Option<f64>,
}

/// Fields a human operator pinned; each set field wins over every
/// derived value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveOverride {
    pub tone: Option<Tone>,
    pub length: Option<MessageLength>,
    pub content_blocks: Option<Vec<ContentBlock>>,
    pub urgency: Option<UrgencyLevel>,
    pub cta_style: Option<CtaStyle>,
    pub use_emojis: Option<bool>,
}

impl DirectiveOverride {
    pub fn is_empty(&self) -> bool {
        self.tone.is_none()
            && self.length.is_none()
            && self.content_blocks.is_none()
            && self.urgency.is_none()
            && self.cta_style.is_none()
            && self.use_emojis.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationInput {
    pub channel: Channel,
    #[serde(default)]
    pub depth: Depth,
    #[serde(default)]
    pub profile: Option<ProfileSignals>,
    #[serde(default)]
    pub memory: Option<MemorySignals>,
    #[serde(default)]
    pub prediction: Option<PredictionSignals>,
    #[serde(default, rename = "override")]
    pub human_override: Option<DirectiveOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveSource {
    Defaults,
    Profile,
    Memory,
    Prediction,
    HumanOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationDirective {
    pub channel: Channel,
    pub depth: Depth,
    pub tone: Tone,
    pub length: MessageLength,
    pub content_blocks: Vec<ContentBlock>,
    pub urgency: UrgencyLevel,
    pub cta_style: CtaStyle,
    pub use_emojis: bool,
    pub confidence: f64,
    pub sources: Vec<DirectiveSource>,
}
