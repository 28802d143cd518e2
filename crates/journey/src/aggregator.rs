//! Journey aggregator — one journey per buyer email, recomputed from scratch
//! on every call. Output depends only on the input rows, lookup and query.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use cubo_core::types::{non_blank, SaleRecord};
use cubo_core::OfferLookup;

use crate::types::{resolve_product, CustomerJourney, JourneyPurchase, JourneyQuery};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Group sale rows into customer journeys, sorted by total spent (highest first).
///
/// Rows without a buyer email are skipped: a journey cannot be keyed without
/// an identity.
pub fn aggregate_journeys(
    rows: &[SaleRecord],
    lookup: &OfferLookup,
    query: &JourneyQuery,
) -> Vec<CustomerJourney> {
    let mut by_email: BTreeMap<String, Vec<&SaleRecord>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in rows {
        match row.identity() {
            Some(email) => by_email.entry(email).or_default().push(row),
            None => skipped += 1,
        }
    }

    let buyers = by_email.len();
    let mut journeys: Vec<CustomerJourney> = by_email
        .into_iter()
        .filter_map(|(email, purchases)| build_journey(email, purchases, lookup, query))
        .collect();

    journeys.sort_by(|a, b| {
        b.total_spent
            .partial_cmp(&a.total_spent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.email.cmp(&b.email))
    });

    debug!(
        rows = rows.len(),
        skipped,
        buyers,
        journeys = journeys.len(),
        "Aggregated customer journeys"
    );
    journeys
}

fn build_journey(
    email: String,
    mut rows: Vec<&SaleRecord>,
    lookup: &OfferLookup,
    query: &JourneyQuery,
) -> Option<CustomerJourney> {
    rows.sort_by(|a, b| {
        a.sale_date
            .cmp(&b.sale_date)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });

    let entry = *rows.first()?;
    if !query.date_range.contains(entry.sale_date) {
        return None;
    }
    if let Some(filter) = &query.entry {
        if !filter.matches(entry, lookup) {
            return None;
        }
    }

    let target_index = match &query.target {
        Some(filter) => Some(rows.iter().position(|row| filter.matches(row, lookup))?),
        None => None,
    };

    let purchases: Vec<JourneyPurchase> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let funnel_id = row
                .offer_code
                .as_deref()
                .and_then(|code| lookup.funnel_for_offer(code));
            JourneyPurchase {
                transaction_id: row.transaction_id.clone(),
                product_name: resolve_product(row, lookup).map(str::to_string),
                offer_code: row.offer_code.clone(),
                funnel_id: funnel_id.map(str::to_string),
                funnel_name: funnel_id
                    .and_then(|id| lookup.funnel_name(id))
                    .map(str::to_string),
                sale_date: row.sale_date,
                amount: row.amount,
                status: row.status.clone(),
                is_entry: i == 0,
                is_target: target_index == Some(i),
            }
        })
        .collect();

    let entry_purchase = &purchases[0];
    let subsequent_products = distinct_products(&purchases[1..]);
    let previous_products = target_index
        .map(|t| distinct_products(&purchases[..t]))
        .unwrap_or_default();

    let buyer_name = rows
        .iter()
        .find_map(|row| non_blank(row.buyer_name.as_deref()))
        .map(str::to_string);

    let last_purchase_at = rows.last().map_or(entry.sale_date, |row| row.sale_date);

    Some(CustomerJourney {
        email,
        buyer_name,
        entry_product: entry_purchase.product_name.clone(),
        entry_offer: entry_purchase.offer_code.clone(),
        entry_funnel_id: entry_purchase.funnel_id.clone(),
        entry_funnel_name: entry_purchase.funnel_name.clone(),
        first_purchase_at: entry.sale_date,
        last_purchase_at,
        total_spent: rows.iter().map(|row| row.amount).sum(),
        total_purchases: rows.len(),
        subsequent_products,
        previous_products,
        avg_days_between_purchases: avg_days_between(&rows),
        target_index,
        purchases,
    })
}

/// Distinct product names in order of first occurrence.
fn distinct_products(purchases: &[JourneyPurchase]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for product in purchases.iter().filter_map(|p| p.product_name.as_ref()) {
        if !seen.contains(product) {
            seen.push(product.clone());
        }
    }
    seen
}

/// Mean gap between consecutive purchases in days; `None` below two purchases.
fn avg_days_between(rows: &[&SaleRecord]) -> Option<f64> {
    if rows.len() < 2 {
        return None;
    }
    let total_days: f64 = rows
        .windows(2)
        .map(|pair| (pair[1].sale_date - pair[0].sale_date).num_milliseconds() as f64 / MILLIS_PER_DAY)
        .sum();
    Some(total_days / (rows.len() - 1) as f64)
}
