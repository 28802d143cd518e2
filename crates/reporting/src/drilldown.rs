//! Hierarchical UTM drilldown: source → campaign → adset → creative → placement.
//!
//! Each selection narrows the working set before the next level is broken
//! down. Going back removes only the deepest selection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cubo_core::types::SaleRecord;
use cubo_core::{CuboError, CuboResult, OfferLookup};

use crate::breakdown::{breakdown_of, BreakdownDimension, BreakdownEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtmLevel {
    Source,
    Campaign,
    Adset,
    Creative,
    Placement,
}

impl UtmLevel {
    pub const HIERARCHY: [UtmLevel; 5] = [
        UtmLevel::Source,
        UtmLevel::Campaign,
        UtmLevel::Adset,
        UtmLevel::Creative,
        UtmLevel::Placement,
    ];

    pub fn dimension(&self) -> BreakdownDimension {
        match self {
            UtmLevel::Source => BreakdownDimension::UtmSource,
            UtmLevel::Campaign => BreakdownDimension::UtmCampaign,
            UtmLevel::Adset => BreakdownDimension::UtmAdset,
            UtmLevel::Creative => BreakdownDimension::UtmCreative,
            UtmLevel::Placement => BreakdownDimension::UtmPlacement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmSelection {
    pub level: UtmLevel,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmDrilldown {
    selections: Vec<UtmSelection>,
}

impl UtmDrilldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level the next selection applies to; `None` once every level is selected.
    pub fn current_level(&self) -> Option<UtmLevel> {
        UtmLevel::HIERARCHY.get(self.selections.len()).copied()
    }

    pub fn select(&mut self, value: impl Into<String>) -> CuboResult<()> {
        let level = self.current_level().ok_or_else(|| {
            CuboError::Validation("Drilldown is already at the deepest UTM level".to_string())
        })?;
        let value = value.into();
        debug!(?level, value = %value, "Drilldown select");
        self.selections.push(UtmSelection { level, value });
        Ok(())
    }

    /// Remove the deepest selection. Returns it, or `None` at the top level.
    pub fn back(&mut self) -> Option<UtmSelection> {
        self.selections.pop()
    }

    pub fn reset(&mut self) {
        self.selections.clear();
    }

    pub fn breadcrumbs(&self) -> &[UtmSelection] {
        &self.selections
    }

    /// Rows matching every selection so far.
    pub fn working_set<'a>(&self, rows: &'a [SaleRecord], lookup: &OfferLookup) -> Vec<&'a SaleRecord> {
        rows.iter()
            .filter(|row| {
                self.selections.iter().all(|s| {
                    s.level.dimension().key_for(row, lookup) == Some(s.value.as_str())
                })
            })
            .collect()
    }

    /// Breakdown of the working set on the current level.
    pub fn current_breakdown(&self, rows: &[SaleRecord], lookup: &OfferLookup) -> Vec<BreakdownEntry> {
        let Some(level) = self.current_level() else {
            return Vec::new();
        };
        breakdown_of(self.working_set(rows, lookup), lookup, level.dimension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cubo_core::types::SaleStatus;

    fn make_sale(email: &str, source: &str, campaign: &str, adset: &str) -> SaleRecord {
        SaleRecord {
            transaction_id: format!("{}-{}-{}-{}", email, source, campaign, adset),
            project_id: "p1".to_string(),
            buyer_email: Some(email.to_string()),
            buyer_name: None,
            product_name: None,
            offer_code: None,
            sale_date: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            amount: 1.0,
            status: SaleStatus::Approved,
            utm_source: Some(source.to_string()),
            utm_campaign: Some(campaign.to_string()),
            utm_adset: Some(adset.to_string()),
            utm_creative: None,
            utm_placement: None,
        }
    }

    fn make_rows() -> Vec<SaleRecord> {
        vec![
            make_sale("a@x.com", "facebook", "lancamento", "lookalike"),
            make_sale("b@x.com", "facebook", "lancamento", "interesses"),
            make_sale("c@x.com", "facebook", "perpetuo", "lookalike"),
            make_sale("d@x.com", "google", "lancamento", "search"),
        ]
    }

    #[test]
    fn test_top_level_is_source_breakdown() {
        let drill = UtmDrilldown::new();
        let lookup = OfferLookup::default();
        let entries = drill.current_breakdown(&make_rows(), &lookup);
        assert_eq!(drill.current_level(), Some(UtmLevel::Source));
        assert_eq!(entries[0].key, "facebook");
        assert_eq!(entries[0].count, 3);
    }

    #[test]
    fn test_selections_narrow_cumulatively() {
        let rows = make_rows();
        let lookup = OfferLookup::default();
        let mut drill = UtmDrilldown::new();

        drill.select("facebook").unwrap();
        let campaigns = drill.current_breakdown(&rows, &lookup);
        assert_eq!(campaigns.len(), 2);
        assert_eq!(campaigns[0].key, "lancamento");
        assert_eq!(campaigns[0].count, 2);

        drill.select("lancamento").unwrap();
        assert_eq!(drill.working_set(&rows, &lookup).len(), 2);
        let adsets = drill.current_breakdown(&rows, &lookup);
        let keys: Vec<_> = adsets.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["interesses", "lookalike"]);
    }

    #[test]
    fn test_back_removes_only_deepest_level() {
        let rows = make_rows();
        let lookup = OfferLookup::default();
        let mut drill = UtmDrilldown::new();
        drill.select("facebook").unwrap();
        let before = drill.working_set(&rows, &lookup).len();

        drill.select("perpetuo").unwrap();
        assert_eq!(drill.working_set(&rows, &lookup).len(), 1);

        let removed = drill.back().unwrap();
        assert_eq!(removed.level, UtmLevel::Campaign);
        assert_eq!(drill.breadcrumbs().len(), 1);
        assert_eq!(drill.working_set(&rows, &lookup).len(), before);
        assert_eq!(drill.current_level(), Some(UtmLevel::Campaign));
    }

    #[test]
    fn test_select_past_deepest_level_fails() {
        let mut drill = UtmDrilldown::new();
        for value in ["s", "c", "a", "cr", "p"] {
            drill.select(value).unwrap();
        }
        assert_eq!(drill.current_level(), None);
        assert!(drill.select("extra").is_err());
        assert!(drill.current_breakdown(&make_rows(), &OfferLookup::default()).is_empty());

        drill.reset();
        assert!(drill.back().is_none());
    }
}
