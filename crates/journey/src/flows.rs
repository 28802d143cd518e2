//! Journey-level rollups: headline summary and product-to-product flows.

use std::collections::BTreeMap;

use crate::types::{CustomerJourney, JourneySummary, ProductFlow};

pub fn summarize(journeys: &[CustomerJourney]) -> JourneySummary {
    let total_customers = journeys.len();
    let total_revenue: f64 = journeys.iter().map(|j| j.total_spent).sum();
    let total_purchases: usize = journeys.iter().map(|j| j.total_purchases).sum();
    let repeat_customers = journeys.iter().filter(|j| j.is_repeat()).count();

    let intervals: Vec<f64> = journeys
        .iter()
        .filter_map(|j| j.avg_days_between_purchases)
        .collect();
    let avg_days_between_purchases = if intervals.is_empty() {
        None
    } else {
        Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
    };

    let per_customer = |value: f64| {
        if total_customers > 0 {
            value / total_customers as f64
        } else {
            0.0
        }
    };

    JourneySummary {
        total_customers,
        total_revenue,
        avg_ltv: per_customer(total_revenue),
        avg_purchases: per_customer(total_purchases as f64),
        repeat_customers,
        repeat_rate: per_customer(repeat_customers as f64) * 100.0,
        avg_days_between_purchases,
    }
}

/// Count consecutive product transitions across all journeys.
/// Purchases without a product break the chain on either side.
pub fn product_flows(journeys: &[CustomerJourney]) -> Vec<ProductFlow> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();

    for journey in journeys {
        for pair in journey.purchases.windows(2) {
            if let (Some(from), Some(to)) = (&pair[0].product_name, &pair[1].product_name) {
                *counts.entry((from.clone(), to.clone())).or_default() += 1;
            }
        }
    }

    let mut flows: Vec<ProductFlow> = counts
        .into_iter()
        .map(|((from, to), count)| ProductFlow { from, to, count })
        .collect();
    // Stable sort: ties keep (from, to) order.
    flows.sort_by(|a, b| b.count.cmp(&a.count));
    flows
}
