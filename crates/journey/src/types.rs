use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cubo_core::types::{non_blank, DateRange, SaleRecord, SaleStatus};
use cubo_core::OfferLookup;

/// Matches a sale by product name, resolved funnel or offer code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum JourneyFilter {
    Product(String),
    Funnel(String),
    Offer(String),
}

impl JourneyFilter {
    pub fn matches(&self, row: &SaleRecord, lookup: &OfferLookup) -> bool {
        match self {
            JourneyFilter::Product(product) => resolve_product(row, lookup) == Some(product.as_str()),
            JourneyFilter::Offer(code) => row.offer_code.as_deref() == Some(code.as_str()),
            JourneyFilter::Funnel(funnel_id) => row
                .offer_code
                .as_deref()
                .and_then(|code| lookup.funnel_for_offer(code))
                == Some(funnel_id.as_str()),
        }
    }
}

/// Product of a sale row, falling back to the product mapped to its offer code.
pub fn resolve_product<'a>(row: &'a SaleRecord, lookup: &'a OfferLookup) -> Option<&'a str> {
    non_blank(row.product_name.as_deref()).or_else(|| {
        row.offer_code
            .as_deref()
            .and_then(|code| lookup.product_for_offer(code))
    })
}

/// Filters applied on top of the project/status-scoped sale rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JourneyQuery {
    /// Applied to the first purchase of each customer.
    #[serde(default)]
    pub entry: Option<JourneyFilter>,
    /// Reverse analysis: keep customers who eventually bought this.
    #[serde(default)]
    pub target: Option<JourneyFilter>,
    /// Applied to the first purchase date.
    #[serde(default)]
    pub date_range: DateRange,
}

/// One purchase inside a customer's journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyPurchase {
    pub transaction_id: String,
    pub product_name: Option<String>,
    pub offer_code: Option<String>,
    pub funnel_id: Option<String>,
    pub funnel_name: Option<String>,
    pub sale_date: DateTime<Utc>,
    pub amount: f64,
    pub status: SaleStatus,
    pub is_entry: bool,
    pub is_target: bool,
}

/// A single customer's ordered purchases plus derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerJourney {
    pub email: String,
    pub buyer_name: Option<String>,
    pub purchases: Vec<JourneyPurchase>,
    pub entry_product: Option<String>,
    pub entry_offer: Option<String>,
    pub entry_funnel_id: Option<String>,
    pub entry_funnel_name: Option<String>,
    pub first_purchase_at: DateTime<Utc>,
    pub last_purchase_at: DateTime<Utc>,
    pub total_spent: f64,
    pub total_purchases: usize,
    pub subsequent_products: Vec<String>,
    pub previous_products: Vec<String>,
    pub avg_days_between_purchases: Option<f64>,
    pub target_index: Option<usize>,
}

impl CustomerJourney {
    pub fn is_repeat(&self) -> bool {
        self.total_purchases > 1
    }
}

/// Headline numbers over a set of journeys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneySummary {
    pub total_customers: usize,
    pub total_revenue: f64,
    pub avg_ltv: f64,
    pub avg_purchases: f64,
    pub repeat_customers: usize,
    pub repeat_rate: f64,
    pub avg_days_between_purchases: Option<f64>,
}

/// How often customers bought `to` right after `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFlow {
    pub from: String,
    pub to: String,
    pub count: usize,
}
