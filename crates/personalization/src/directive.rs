//! Layered message directive: defaults, then profile, memory, prediction,
//! channel, depth and finally the human override. Each layer may overwrite
//! what an earlier one chose.

use tracing::debug;

use crate::types::{
    Channel, ContentBlock, CtaStyle, DirectiveOverride, DirectiveSource, Intent, MemorySignals,
    MessageLength, PersonalityTrait, PersonalizationDirective, PersonalizationInput,
    PredictionSignals, ProfileSignals, Tone, UrgencyLevel,
};

const BASE_CONFIDENCE: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 0.95;

const TIME_OBJECTION_KEYWORDS: [&str; 5] = ["tempo", "time", "pressa", "ocupado", "busy"];
const PRICE_OBJECTION_KEYWORDS: [&str; 6] = ["preço", "preco", "caro", "valor", "price", "expensive"];

struct Draft {
    tone: Tone,
    length: MessageLength,
    blocks: Vec<ContentBlock>,
    urgency: UrgencyLevel,
    cta_style: CtaStyle,
    use_emojis: bool,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            tone: Tone::Friendly,
            length: MessageLength::Medium,
            blocks: vec![
                ContentBlock::Benefits,
                ContentBlock::SocialProof,
                ContentBlock::CallToAction,
            ],
            urgency: UrgencyLevel::Medium,
            cta_style: CtaStyle::Soft,
            use_emojis: false,
        }
    }
}

struct ChannelRules {
    max_length: Option<MessageLength>,
    use_emojis: bool,
}

fn channel_rules(channel: Channel) -> ChannelRules {
    match channel {
        Channel::Whatsapp => ChannelRules {
            max_length: Some(MessageLength::Medium),
            use_emojis: true,
        },
        Channel::Email => ChannelRules {
            max_length: None,
            use_emojis: false,
        },
        Channel::Sms => ChannelRules {
            max_length: Some(MessageLength::Short),
            use_emojis: false,
        },
        Channel::Instagram => ChannelRules {
            max_length: Some(MessageLength::Short),
            use_emojis: true,
        },
        Channel::Web => ChannelRules {
            max_length: None,
            use_emojis: false,
        },
    }
}

fn mentions_any(texts: &[String], keywords: &[&str]) -> bool {
    texts.iter().any(|text| {
        let text = text.to_lowercase();
        keywords.iter().any(|k| text.contains(k))
    })
}

fn apply_profile(draft: &mut Draft, profile: &ProfileSignals) {
    if let Some(trait_) = profile.dominant_trait {
        use ContentBlock::*;
        let (tone, blocks) = match trait_ {
            PersonalityTrait::Analytical => (
                Tone::Professional,
                vec![TechnicalDetails, CaseStudy, PriceComparison, Benefits],
            ),
            PersonalityTrait::Emotional => {
                (Tone::Empathetic, vec![PersonalStory, Testimonial, Benefits])
            }
            PersonalityTrait::Pragmatic => {
                (Tone::Direct, vec![Benefits, PriceComparison, CallToAction])
            }
            PersonalityTrait::Social => (Tone::Friendly, vec![SocialProof, Testimonial, Benefits]),
        };
        draft.tone = tone;
        draft.blocks = blocks;
    }

    match profile.dominant_intent {
        Some(Intent::Buy) => draft.cta_style = CtaStyle::Direct,
        Some(Intent::Research) => {
            draft.length = MessageLength::Long;
            draft.blocks.push(ContentBlock::Faq);
        }
        Some(Intent::Compare) => draft.blocks.push(ContentBlock::PriceComparison),
        Some(Intent::Support) => {
            draft.tone = Tone::Empathetic;
            draft.blocks.push(ContentBlock::Faq);
        }
        Some(Intent::Churn) => {
            draft.tone = Tone::Empathetic;
            draft.blocks.push(ContentBlock::Guarantee);
        }
        None => {}
    }
}

fn apply_memory(draft: &mut Draft, memory: &MemorySignals) {
    if !memory.pain_points.is_empty() {
        draft.tone = Tone::Empathetic;
    }
    if mentions_any(&memory.objections, &TIME_OBJECTION_KEYWORDS) {
        draft.length = MessageLength::Short;
    }
    if !memory.fears.is_empty() {
        draft.blocks.push(ContentBlock::Guarantee);
        draft.blocks.push(ContentBlock::Testimonial);
    }
    if mentions_any(&memory.objections, &PRICE_OBJECTION_KEYWORDS) {
        draft.blocks.push(ContentBlock::PriceComparison);
    }
}

fn apply_prediction(draft: &mut Draft, prediction: &PredictionSignals) {
    let (urgency, cta_style) = if prediction.urgency_score >= 0.7 {
        (UrgencyLevel::High, CtaStyle::Urgent)
    } else if prediction.urgency_score >= 0.4 {
        (UrgencyLevel::Medium, CtaStyle::Direct)
    } else {
        (UrgencyLevel::Low, CtaStyle::Soft)
    };
    draft.urgency = urgency;
    draft.cta_style = cta_style;
    if prediction.purchase_probability.unwrap_or(0.0) >= 0.7 {
        draft.blocks.push(ContentBlock::Scarcity);
    }
}

fn apply_override(draft: &mut Draft, human: &DirectiveOverride) {
    if let Some(tone) = human.tone {
        draft.tone = tone;
    }
    if let Some(length) = human.length {
        draft.length = length;
    }
    if let Some(blocks) = &human.content_blocks {
        draft.blocks = blocks.clone();
    }
    if let Some(urgency) = human.urgency {
        draft.urgency = urgency;
    }
    if let Some(cta_style) = human.cta_style {
        draft.cta_style = cta_style;
    }
    if let Some(use_emojis) = human.use_emojis {
        draft.use_emojis = use_emojis;
    }
}

fn dedup_blocks(blocks: &mut Vec<ContentBlock>) {
    let mut seen = Vec::with_capacity(blocks.len());
    blocks.retain(|b| {
        if seen.contains(b) {
            false
        } else {
            seen.push(*b);
            true
        }
    });
}

pub fn build_directive(input: &PersonalizationInput) -> PersonalizationDirective {
    let mut draft = Draft::default();
    let mut sources = vec![DirectiveSource::Defaults];
    let mut confidence = BASE_CONFIDENCE;

    if let Some(profile) = input.profile.as_ref().filter(|p| !p.is_empty()) {
        apply_profile(&mut draft, profile);
        sources.push(DirectiveSource::Profile);
        confidence += 0.25;
    }
    if let Some(memory) = input.memory.as_ref().filter(|m| !m.is_empty()) {
        apply_memory(&mut draft, memory);
        sources.push(DirectiveSource::Memory);
        confidence += 0.2;
    }
    if let Some(prediction) = &input.prediction {
        apply_prediction(&mut draft, prediction);
        sources.push(DirectiveSource::Prediction);
        confidence += 0.15;
    }

    let rules = channel_rules(input.channel);
    if let Some(max_length) = rules.max_length {
        draft.length = draft.length.min(max_length);
    }
    draft.use_emojis = rules.use_emojis;

    dedup_blocks(&mut draft.blocks);
    if let Some(max) = input.depth.max_blocks() {
        draft.blocks.truncate(max);
    }

    if let Some(human) = input.human_override.as_ref().filter(|o| !o.is_empty()) {
        apply_override(&mut draft, human);
        sources.push(DirectiveSource::HumanOverride);
        confidence += 0.1;
    }

    let directive = PersonalizationDirective {
        channel: input.channel,
        depth: input.depth,
        tone: draft.tone,
        length: draft.length,
        content_blocks: draft.blocks,
        urgency: draft.urgency,
        cta_style: draft.cta_style,
        use_emojis: draft.use_emojis,
        confidence: confidence.min(MAX_CONFIDENCE),
        sources,
    };
    debug!(
        channel = ?directive.channel,
        tone = ?directive.tone,
        blocks = directive.content_blocks.len(),
        confidence = directive.confidence,
        "Built personalization directive"
    );
    directive
}
