//! Dashboard breakdowns — grouped counts and unique buyers per categorical
//! dimension, computed over the unfiltered sale rows.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cubo_core::types::{non_blank, SaleRecord, SaleStatus};
use cubo_core::{CuboError, OfferLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownDimension {
    Status,
    Product,
    Offer,
    Funnel,
    Position,
    UtmSource,
    UtmCampaign,
    UtmAdset,
    UtmCreative,
    UtmPlacement,
}

impl BreakdownDimension {
    pub const ALL: [BreakdownDimension; 10] = [
        BreakdownDimension::Status,
        BreakdownDimension::Product,
        BreakdownDimension::Offer,
        BreakdownDimension::Funnel,
        BreakdownDimension::Position,
        BreakdownDimension::UtmSource,
        BreakdownDimension::UtmCampaign,
        BreakdownDimension::UtmAdset,
        BreakdownDimension::UtmCreative,
        BreakdownDimension::UtmPlacement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakdownDimension::Status => "status",
            BreakdownDimension::Product => "product",
            BreakdownDimension::Offer => "offer",
            BreakdownDimension::Funnel => "funnel",
            BreakdownDimension::Position => "position",
            BreakdownDimension::UtmSource => "utm_source",
            BreakdownDimension::UtmCampaign => "utm_campaign",
            BreakdownDimension::UtmAdset => "utm_adset",
            BreakdownDimension::UtmCreative => "utm_creative",
            BreakdownDimension::UtmPlacement => "utm_placement",
        }
    }

    /// Grouping key of a row for this dimension. Blank values count as missing.
    pub fn key_for<'a>(&self, row: &'a SaleRecord, lookup: &'a OfferLookup) -> Option<&'a str> {
        let offer = || non_blank(row.offer_code.as_deref());
        match self {
            BreakdownDimension::Status => Some(row.status.key()),
            BreakdownDimension::Product => non_blank(row.product_name.as_deref()),
            BreakdownDimension::Offer => offer(),
            BreakdownDimension::Funnel => offer().and_then(|code| lookup.funnel_for_offer(code)),
            BreakdownDimension::Position => {
                offer().and_then(|code| lookup.position_for_offer(code))
            }
            BreakdownDimension::UtmSource => non_blank(row.utm_source.as_deref()),
            BreakdownDimension::UtmCampaign => non_blank(row.utm_campaign.as_deref()),
            BreakdownDimension::UtmAdset => non_blank(row.utm_adset.as_deref()),
            BreakdownDimension::UtmCreative => non_blank(row.utm_creative.as_deref()),
            BreakdownDimension::UtmPlacement => non_blank(row.utm_placement.as_deref()),
        }
    }

    fn label_for(&self, key: &str, lookup: &OfferLookup) -> String {
        match self {
            BreakdownDimension::Status => SaleStatus::from(key).label().to_string(),
            BreakdownDimension::Funnel => lookup.funnel_name(key).unwrap_or(key).to_string(),
            _ => key.to_string(),
        }
    }
}

impl fmt::Display for BreakdownDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreakdownDimension {
    type Err = CuboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BreakdownDimension::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| CuboError::Validation(format!("Unknown breakdown dimension: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub key: String,
    pub label: String,
    pub count: usize,
    pub unique_clients: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub dimension: BreakdownDimension,
    /// Rows with a non-null key for the dimension.
    pub total_rows: usize,
    pub entries: Vec<BreakdownEntry>,
}

/// Group rows by the dimension's key and tally rows and distinct buyers.
/// Sorted by count (highest first), ties by key.
pub fn compute_breakdown(
    rows: &[SaleRecord],
    lookup: &OfferLookup,
    dimension: BreakdownDimension,
) -> Vec<BreakdownEntry> {
    breakdown_of(rows, lookup, dimension)
}

pub(crate) fn breakdown_of<'a, I>(
    rows: I,
    lookup: &'a OfferLookup,
    dimension: BreakdownDimension,
) -> Vec<BreakdownEntry>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut groups: BTreeMap<&str, (usize, HashSet<String>)> = BTreeMap::new();

    for row in rows {
        let Some(key) = dimension.key_for(row, lookup) else {
            continue;
        };
        let group = groups.entry(key).or_default();
        group.0 += 1;
        if let Some(email) = row.identity() {
            group.1.insert(email);
        }
    }

    let mut entries: Vec<BreakdownEntry> = groups
        .into_iter()
        .map(|(key, (count, clients))| BreakdownEntry {
            key: key.to_string(),
            label: dimension.label_for(key, lookup),
            count,
            unique_clients: clients.len(),
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

pub fn compute_breakdowns(
    rows: &[SaleRecord],
    lookup: &OfferLookup,
    dimensions: &[BreakdownDimension],
) -> Vec<DimensionBreakdown> {
    let breakdowns: Vec<DimensionBreakdown> = dimensions
        .iter()
        .map(|&dimension| {
            let entries = compute_breakdown(rows, lookup, dimension);
            DimensionBreakdown {
                dimension,
                total_rows: entries.iter().map(|e| e.count).sum(),
                entries,
            }
        })
        .collect();
    debug!(
        rows = rows.len(),
        dimensions = breakdowns.len(),
        "Computed breakdowns"
    );
    breakdowns
}
