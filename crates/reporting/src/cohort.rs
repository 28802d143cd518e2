//! Acquisition cohorts — lifetime value and repeat rate grouped by the
//! funnel (or product) each customer entered through.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cubo_core::types::UNDEFINED_LABEL;
use cubo_journey::types::CustomerJourney;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortKind {
    Funnel,
    Product,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMetrics {
    pub cohort_key: String,
    pub label: String,
    pub kind: CohortKind,
    pub customer_count: usize,
    pub total_revenue: f64,
    pub avg_ltv: f64,
    pub avg_purchases: f64,
    /// Percentage of customers with more than one purchase.
    pub repeat_rate: f64,
}

#[derive(Default)]
struct CohortAccumulator {
    label: String,
    customers: usize,
    revenue: f64,
    purchases: usize,
    repeat: usize,
}

/// Bucket journeys by entry funnel (falling back to entry product) and
/// compute per-cohort value metrics, sorted by average LTV (highest first).
pub fn analyze_cohorts(journeys: &[CustomerJourney]) -> Vec<CohortMetrics> {
    let mut buckets: BTreeMap<(CohortKind, String), CohortAccumulator> = BTreeMap::new();

    for journey in journeys {
        let (kind, key, label) = match &journey.entry_funnel_id {
            Some(funnel_id) => (
                CohortKind::Funnel,
                funnel_id.clone(),
                journey
                    .entry_funnel_name
                    .clone()
                    .unwrap_or_else(|| funnel_id.clone()),
            ),
            None => {
                let product = journey
                    .entry_product
                    .clone()
                    .unwrap_or_else(|| UNDEFINED_LABEL.to_string());
                (CohortKind::Product, product.clone(), product)
            }
        };

        let acc = buckets.entry((kind, key)).or_insert_with(|| CohortAccumulator {
            label,
            ..Default::default()
        });
        acc.customers += 1;
        acc.revenue += journey.total_spent;
        acc.purchases += journey.total_purchases;
        if journey.is_repeat() {
            acc.repeat += 1;
        }
    }

    let mut cohorts: Vec<CohortMetrics> = buckets
        .into_iter()
        .map(|((kind, key), acc)| {
            let customers = acc.customers as f64;
            CohortMetrics {
                cohort_key: key,
                label: acc.label,
                kind,
                customer_count: acc.customers,
                total_revenue: acc.revenue,
                avg_ltv: acc.revenue / customers,
                avg_purchases: acc.purchases as f64 / customers,
                repeat_rate: acc.repeat as f64 / customers * 100.0,
            }
        })
        .collect();

    cohorts.sort_by(|a, b| b.avg_ltv.partial_cmp(&a.avg_ltv).unwrap_or(Ordering::Equal));
    cohorts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_journey(
        email: &str,
        funnel: Option<(&str, &str)>,
        product: Option<&str>,
        spent: f64,
        purchases: usize,
    ) -> CustomerJourney {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        CustomerJourney {
            email: email.to_string(),
            buyer_name: None,
            purchases: Vec::new(),
            entry_product: product.map(str::to_string),
            entry_offer: None,
            entry_funnel_id: funnel.map(|(id, _)| id.to_string()),
            entry_funnel_name: funnel.map(|(_, name)| name.to_string()),
            first_purchase_at: at,
            last_purchase_at: at,
            total_spent: spent,
            total_purchases: purchases,
            subsequent_products: Vec::new(),
            previous_products: Vec::new(),
            avg_days_between_purchases: None,
            target_index: None,
        }
    }

    #[test]
    fn test_cohorts_bucket_by_funnel_then_product() {
        let journeys = vec![
            make_journey("a@x.com", Some(("f1", "Webinar")), Some("Ebook"), 300.0, 3),
            make_journey("b@x.com", Some(("f1", "Webinar")), Some("Ebook"), 100.0, 1),
            make_journey("c@x.com", None, Some("Workshop"), 1000.0, 2),
            make_journey("d@x.com", None, None, 10.0, 1),
        ];
        let cohorts = analyze_cohorts(&journeys);
        assert_eq!(cohorts.len(), 3);

        assert_eq!(cohorts[0].cohort_key, "Workshop");
        assert_eq!(cohorts[0].kind, CohortKind::Product);
        assert_eq!(cohorts[0].repeat_rate, 100.0);

        let webinar = &cohorts[1];
        assert_eq!(webinar.cohort_key, "f1");
        assert_eq!(webinar.label, "Webinar");
        assert_eq!(webinar.customer_count, 2);
        assert_eq!(webinar.total_revenue, 400.0);
        assert_eq!(webinar.avg_ltv, 200.0);
        assert_eq!(webinar.avg_purchases, 2.0);
        assert_eq!(webinar.repeat_rate, 50.0);

        assert_eq!(cohorts[2].cohort_key, UNDEFINED_LABEL);
    }

    #[test]
    fn test_ltv_times_customers_equals_revenue() {
        let journeys: Vec<CustomerJourney> = (0..17)
            .map(|i| {
                let funnel = if i % 3 == 0 { Some(("f1", "A")) } else { Some(("f2", "B")) };
                make_journey(&format!("{}@x.com", i), funnel, None, 33.3 * i as f64, 1 + i % 4)
            })
            .collect();
        for cohort in analyze_cohorts(&journeys) {
            let reconstructed = cohort.avg_ltv * cohort.customer_count as f64;
            assert!((reconstructed - cohort.total_revenue).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(analyze_cohorts(&[]).is_empty());
    }
}
