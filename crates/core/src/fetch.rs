//! Row fetcher — sequential paginated reads against the tabular store.
//!
//! The store itself is a black box behind [`PageSource`]. Pages are requested
//! one after another; a page shorter than the page size ends the scan.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{CuboError, CuboResult};
use crate::lookup::OfferLookup;
use crate::types::{Funnel, OfferMapping, SaleRecord, SaleStatus};

pub const SALES_TABLE: &str = "sales";
pub const OFFER_MAPPINGS_TABLE: &str = "offer_mappings";
pub const FUNNELS_TABLE: &str = "funnels";
pub const CONTACTS_TABLE: &str = "contacts";

/// Predicate on a single named column.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
}

/// A project-scoped read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub table: String,
    pub project_id: String,
    pub filters: Vec<RowFilter>,
}

impl RowQuery {
    pub fn new(table: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            project_id: project_id.into(),
            filters: Vec::new(),
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(RowFilter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(RowFilter::In(column.to_string(), values));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(RowFilter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(RowFilter::Lte(column.to_string(), value.into()));
        self
    }

    /// Whether a raw row satisfies the project scope and every filter.
    pub fn matches(&self, row: &Value) -> bool {
        if row.get("project_id").and_then(Value::as_str) != Some(self.project_id.as_str()) {
            return false;
        }
        self.filters.iter().all(|filter| match filter {
            RowFilter::Eq(column, expected) => row.get(column) == Some(expected),
            RowFilter::In(column, values) => row
                .get(column)
                .map_or(false, |actual| values.contains(actual)),
            RowFilter::Gte(column, bound) => row
                .get(column)
                .and_then(|actual| compare_values(actual, bound))
                .map_or(false, |o| o != Ordering::Less),
            RowFilter::Lte(column, bound) => row
                .get(column)
                .and_then(|actual| compare_values(actual, bound))
                .map_or(false, |o| o != Ordering::Greater),
        })
    }
}

/// Numbers compare numerically, strings lexically (RFC 3339 timestamps sort correctly).
fn compare_values(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// Paginated tabular read API.
pub trait PageSource {
    /// Return at most `limit` rows matching `query`, skipping the first `offset`.
    fn fetch_page(
        &self,
        query: &RowQuery,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = CuboResult<Vec<Value>>> + Send;
}

/// Fetch every row matching `query`, one page at a time.
pub async fn fetch_all<T, S>(source: &S, query: &RowQuery, page_size: usize) -> CuboResult<Vec<T>>
where
    T: DeserializeOwned,
    S: PageSource,
{
    if page_size == 0 {
        return Err(CuboError::Config("page_size must be greater than zero".to_string()));
    }

    let mut rows = Vec::new();
    let mut offset = 0;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(query, offset, page_size).await?;
        let len = page.len();
        pages += 1;
        debug!(table = %query.table, page = pages, rows = len, "Fetched page");
        metrics::counter!("fetch.pages", "table" => query.table.clone()).increment(1);

        for value in page {
            rows.push(serde_json::from_value(value)?);
        }

        if len < page_size {
            break;
        }
        offset += len;
    }

    info!(
        table = %query.table,
        project_id = %query.project_id,
        rows = rows.len(),
        pages,
        "Fetch complete"
    );
    Ok(rows)
}

/// In-memory page source over named tables of JSON rows.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<Value>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, rows: Vec<Value>) -> Self {
        self.insert_table(table, rows);
        self
    }

    pub fn insert_table(&mut self, table: &str, rows: Vec<Value>) {
        self.tables.insert(table.to_string(), rows);
    }

    pub fn table_len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }
}

impl PageSource for MemorySource {
    async fn fetch_page(
        &self,
        query: &RowQuery,
        offset: usize,
        limit: usize,
    ) -> CuboResult<Vec<Value>> {
        let rows = self
            .tables
            .get(&query.table)
            .ok_or_else(|| CuboError::Fetch(format!("Table {} not found", query.table)))?;

        Ok(rows
            .iter()
            .filter(|row| query.matches(row))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Everything the journey and breakdown views need, fetched together.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub sales: Vec<SaleRecord>,
    pub offer_mappings: Vec<OfferMapping>,
    pub funnels: Vec<Funnel>,
}

impl Dataset {
    pub fn lookup(&self) -> OfferLookup {
        OfferLookup::build(&self.offer_mappings, &self.funnels)
    }

    /// SHA-256 hex digest over every fetched row, in fetch order.
    pub fn fingerprint(&self) -> CuboResult<String> {
        let content = serde_json::to_vec(&(&self.sales, &self.offer_mappings, &self.funnels))?;
        let mut hasher = Sha256::new();
        hasher.update(&content);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Keep sales whose parsed status is one of `statuses`, ignoring case.
/// An empty list keeps everything.
pub fn retain_statuses(sales: &mut Vec<SaleRecord>, statuses: &[String]) {
    if statuses.is_empty() {
        return;
    }
    let wanted: Vec<SaleStatus> = statuses.iter().map(|s| SaleStatus::from(s.as_str())).collect();
    sales.retain(|sale| {
        wanted
            .iter()
            .any(|w| w.key().eq_ignore_ascii_case(sale.status.key().trim()))
    });
}

/// Fetch sales plus the reference tables concurrently, then keep the sales
/// in `statuses`. Status matching happens after parsing, so the store's
/// spelling of a status does not matter. Resolves only once all three
/// reads have completed.
pub async fn load_dataset<S>(
    source: &S,
    project_id: &str,
    statuses: &[String],
    page_size: usize,
) -> CuboResult<Dataset>
where
    S: PageSource,
{
    let sales_query = RowQuery::new(SALES_TABLE, project_id);
    let mappings_query = RowQuery::new(OFFER_MAPPINGS_TABLE, project_id);
    let funnels_query = RowQuery::new(FUNNELS_TABLE, project_id);

    let (mut sales, offer_mappings, funnels) = tokio::try_join!(
        fetch_all::<SaleRecord, S>(source, &sales_query, page_size),
        fetch_all::<OfferMapping, S>(source, &mappings_query, page_size),
        fetch_all::<Funnel, S>(source, &funnels_query, page_size),
    )?;
    retain_statuses(&mut sales, statuses);

    Ok(Dataset {
        sales,
        offer_mappings,
        funnels,
    })
}

/// Fetch every sale of the project regardless of status.
pub async fn load_unfiltered_sales<S>(
    source: &S,
    project_id: &str,
    page_size: usize,
) -> CuboResult<Vec<SaleRecord>>
where
    S: PageSource,
{
    fetch_all(source, &RowQuery::new(SALES_TABLE, project_id), page_size).await
}
