//! UTM attribution — conversion and value metrics per first-touch UTM value.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cubo_core::types::{non_blank, UtmContact, UNDEFINED_LABEL};
use cubo_core::CuboError;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtmDimension {
    Source,
    Campaign,
    Medium,
    Adset,
    Ad,
    Creative,
}

impl UtmDimension {
    pub const ALL: [UtmDimension; 6] = [
        UtmDimension::Source,
        UtmDimension::Campaign,
        UtmDimension::Medium,
        UtmDimension::Adset,
        UtmDimension::Ad,
        UtmDimension::Creative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UtmDimension::Source => "source",
            UtmDimension::Campaign => "campaign",
            UtmDimension::Medium => "medium",
            UtmDimension::Adset => "adset",
            UtmDimension::Ad => "ad",
            UtmDimension::Creative => "creative",
        }
    }

    pub fn value_of<'a>(&self, contact: &'a UtmContact) -> Option<&'a str> {
        let raw = match self {
            UtmDimension::Source => &contact.utm_source,
            UtmDimension::Campaign => &contact.utm_campaign,
            UtmDimension::Medium => &contact.utm_medium,
            UtmDimension::Adset => &contact.utm_adset,
            UtmDimension::Ad => &contact.utm_ad,
            UtmDimension::Creative => &contact.utm_creative,
        };
        non_blank(raw.as_deref())
    }
}

impl fmt::Display for UtmDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UtmDimension {
    type Err = CuboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.strip_prefix("utm_").unwrap_or(&wanted);
        UtmDimension::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| CuboError::Validation(format!("Unknown UTM dimension: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtmAttributionRow {
    pub value: String,
    pub total_contacts: usize,
    pub customers: usize,
    /// Customers over contacts, in percent.
    pub conversion_rate: f64,
    pub total_revenue: f64,
    pub avg_ltv: f64,
    pub avg_purchases: f64,
    pub avg_ticket: f64,
    /// Customers with more than one purchase, in percent.
    pub repeat_rate: f64,
    pub avg_days_to_purchase: Option<f64>,
}

#[derive(Default)]
struct UtmAccumulator {
    contacts: usize,
    customers: usize,
    revenue: f64,
    purchases: u64,
    repeat: usize,
    days_to_purchase: Vec<f64>,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Group contacts by a UTM attribute and compute conversion and value
/// metrics per bucket, sorted by revenue (highest first).
pub fn attribute_by_utm(contacts: &[UtmContact], dimension: UtmDimension) -> Vec<UtmAttributionRow> {
    let mut buckets: BTreeMap<&str, UtmAccumulator> = BTreeMap::new();

    for contact in contacts {
        let value = dimension.value_of(contact).unwrap_or(UNDEFINED_LABEL);
        let acc = buckets.entry(value).or_default();
        acc.contacts += 1;
        if !contact.is_customer {
            continue;
        }
        acc.customers += 1;
        acc.revenue += contact.total_revenue;
        acc.purchases += u64::from(contact.purchase_count);
        if contact.purchase_count > 1 {
            acc.repeat += 1;
        }
        if let (Some(seen), Some(bought)) = (contact.first_seen_at, contact.first_purchase_at) {
            let days = (bought - seen).num_milliseconds() as f64 / MILLIS_PER_DAY;
            acc.days_to_purchase.push(days.max(0.0));
        }
    }

    let mut rows: Vec<UtmAttributionRow> = buckets
        .into_iter()
        .map(|(value, acc)| {
            let customers = acc.customers as f64;
            UtmAttributionRow {
                value: value.to_string(),
                total_contacts: acc.contacts,
                customers: acc.customers,
                conversion_rate: ratio(customers, acc.contacts as f64) * 100.0,
                total_revenue: acc.revenue,
                avg_ltv: ratio(acc.revenue, customers),
                avg_purchases: ratio(acc.purchases as f64, customers),
                avg_ticket: ratio(acc.revenue, acc.purchases as f64),
                repeat_rate: ratio(acc.repeat as f64, customers) * 100.0,
                avg_days_to_purchase: if acc.days_to_purchase.is_empty() {
                    None
                } else {
                    Some(
                        acc.days_to_purchase.iter().sum::<f64>()
                            / acc.days_to_purchase.len() as f64,
                    )
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_revenue
            .partial_cmp(&a.total_revenue)
            .unwrap_or(Ordering::Equal)
    });
    debug!(
        contacts = contacts.len(),
        dimension = %dimension,
        buckets = rows.len(),
        "Computed UTM attribution"
    );
    rows
}
