//! Agent boundary gating — schedule, tag and daily-volume limits checked
//! before any scoring happens.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::{AgentBoundaries, ContactContext, WorkingHours};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BoundaryViolation {
    OutsideWorkingHours { local_hour: u32 },
    InvalidWorkingHours { start_hour: u32, end_hour: u32 },
    Weekend,
    ExcludedTag { tag: String },
    MissingRequiredTag { tag: String },
    DailyLimitReached { limit: u32 },
}

impl WorkingHours {
    fn local_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(i64::from(self.utc_offset_minutes))
    }

    pub fn is_valid(&self) -> bool {
        self.start_hour < 24 && self.end_hour < 24
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour == self.end_hour {
            true
        } else if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    fn check(&self, now: DateTime<Utc>) -> Option<BoundaryViolation> {
        // Fails closed for windows built in code with out-of-range hours.
        if !self.is_valid() {
            return Some(BoundaryViolation::InvalidWorkingHours {
                start_hour: self.start_hour,
                end_hour: self.end_hour,
            });
        }
        let local = self.local_time(now);
        if self.exclude_weekends && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return Some(BoundaryViolation::Weekend);
        }
        if !self.contains_hour(local.hour()) {
            return Some(BoundaryViolation::OutsideWorkingHours {
                local_hour: local.hour(),
            });
        }
        None
    }
}

/// First boundary the contact context violates, if any.
pub fn check_boundaries(
    boundaries: &AgentBoundaries,
    context: &ContactContext,
) -> Option<BoundaryViolation> {
    if let Some(hours) = &boundaries.working_hours {
        if let Some(violation) = hours.check(context.now) {
            return Some(violation);
        }
    }

    let has_tag = |tag: &str| context.tags.iter().any(|t| t.eq_ignore_ascii_case(tag));

    if let Some(tag) = boundaries.excluded_tags.iter().find(|t| has_tag(t.as_str())) {
        return Some(BoundaryViolation::ExcludedTag { tag: tag.clone() });
    }
    if let Some(tag) = boundaries.required_tags.iter().find(|t| !has_tag(t.as_str())) {
        return Some(BoundaryViolation::MissingRequiredTag { tag: tag.clone() });
    }
    if let Some(limit) = boundaries.max_daily_actions {
        if context.actions_today >= limit {
            return Some(BoundaryViolation::DailyLimitReached { limit });
        }
    }
    None
}
