//! Fetch-then-aggregate pipeline behind each CLI command.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use cubo_core::fetch::{
    fetch_all, load_dataset, Dataset, MemorySource, PageSource, RowQuery, CONTACTS_TABLE,
    FUNNELS_TABLE, OFFER_MAPPINGS_TABLE, SALES_TABLE,
};
use cubo_core::types::UtmContact;
use cubo_core::{AppConfig, CuboError, CuboResult};
use cubo_journey::types::{CustomerJourney, JourneyQuery, JourneySummary, ProductFlow};
use cubo_journey::{product_flows, summarize, JourneyCache};
use cubo_reporting::attribution::{UtmAttributionRow, UtmDimension};
use cubo_reporting::breakdown::{BreakdownDimension, BreakdownEntry, DimensionBreakdown};
use cubo_reporting::cohort::CohortMetrics;
use cubo_reporting::drilldown::{UtmLevel, UtmSelection};
use cubo_reporting::integrity::IntegrityReport;
use cubo_reporting::{
    analyze_cohorts, attribute_by_utm, compute_breakdowns, integrity_report, UtmDrilldown,
};

const TABLES: [&str; 4] = [SALES_TABLE, OFFER_MAPPINGS_TABLE, FUNNELS_TABLE, CONTACTS_TABLE];

/// Read a JSON document from disk.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CuboResult<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load `DIR/<table>.json` arrays into an in-memory row store. A missing
/// file becomes an empty table.
pub fn load_data_dir(dir: &Path) -> CuboResult<MemorySource> {
    let mut source = MemorySource::new();
    for table in TABLES {
        let path = dir.join(format!("{}.json", table));
        let rows: Vec<Value> = if path.exists() {
            read_json(&path)?
        } else {
            warn!(table, path = %path.display(), "Table file not found, using empty table");
            Vec::new()
        };
        info!(table, rows = rows.len(), "Loaded table");
        source.insert_table(table, rows);
    }
    Ok(source)
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyReport {
    pub summary: JourneySummary,
    pub flows: Vec<ProductFlow>,
    pub journeys: Vec<CustomerJourney>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrilldownView {
    pub breadcrumbs: Vec<UtmSelection>,
    pub level: Option<UtmLevel>,
    pub working_rows: usize,
    pub entries: Vec<BreakdownEntry>,
}

/// Project-scoped analytics over a paginated row source.
pub struct Pipeline<S> {
    source: S,
    config: AppConfig,
    project_id: String,
    cache: JourneyCache,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(source: S, config: AppConfig, project_id: impl Into<String>) -> Self {
        let cache = JourneyCache::new(config.journey.cache_capacity);
        Self {
            source,
            config,
            project_id: project_id.into(),
            cache,
        }
    }

    /// Replace the row source and drop journeys cached from the old one.
    pub fn reload(&mut self, source: S) {
        self.source = source;
        self.cache.clear();
    }

    /// Journeys for the freshly fetched rows. The cache key is the
    /// dataset fingerprint, so a changed store is always re-aggregated.
    async fn cached_journeys(&self, query: &JourneyQuery) -> CuboResult<Arc<Vec<CustomerJourney>>> {
        let dataset = self.paid_dataset().await?;
        let fingerprint = dataset.fingerprint()?;
        Ok(self
            .cache
            .get_or_compute(&fingerprint, &dataset.sales, &dataset.lookup(), query))
    }

    async fn paid_dataset(&self) -> CuboResult<Dataset> {
        load_dataset(
            &self.source,
            &self.project_id,
            &self.config.fetch.statuses,
            self.config.fetch.page_size,
        )
        .await
    }

    async fn full_dataset(&self) -> CuboResult<Dataset> {
        load_dataset(&self.source, &self.project_id, &[], self.config.fetch.page_size).await
    }

    pub async fn journeys(&self, query: &JourneyQuery, limit: Option<usize>) -> CuboResult<JourneyReport> {
        let journeys = self.cached_journeys(query).await?;

        let summary = summarize(&journeys);
        let flows = product_flows(&journeys);
        let shown = limit.unwrap_or(journeys.len()).min(journeys.len());
        info!(
            customers = journeys.len(),
            shown,
            "Journey report ready"
        );
        Ok(JourneyReport {
            summary,
            flows,
            journeys: journeys[..shown].to_vec(),
        })
    }

    pub async fn breakdowns(&self, dimensions: &[BreakdownDimension]) -> CuboResult<Vec<DimensionBreakdown>> {
        let dataset = self.full_dataset().await?;
        Ok(compute_breakdowns(&dataset.sales, &dataset.lookup(), dimensions))
    }

    /// Dimensions from `reporting.default_dimensions`.
    pub fn default_dimensions(&self) -> CuboResult<Vec<BreakdownDimension>> {
        self.config
            .reporting
            .default_dimensions
            .iter()
            .map(|d| d.parse())
            .collect()
    }

    pub async fn cohorts(&self) -> CuboResult<Vec<CohortMetrics>> {
        let journeys = self.cached_journeys(&JourneyQuery::default()).await?;
        Ok(analyze_cohorts(&journeys))
    }

    pub async fn attribution(&self, dimension: UtmDimension) -> CuboResult<Vec<UtmAttributionRow>> {
        let query = RowQuery::new(CONTACTS_TABLE, self.project_id.as_str());
        let contacts: Vec<UtmContact> =
            fetch_all(&self.source, &query, self.config.fetch.page_size).await?;
        Ok(attribute_by_utm(&contacts, dimension))
    }

    pub async fn drilldown(&self, selections: &[String]) -> CuboResult<DrilldownView> {
        let dataset = self.full_dataset().await?;
        let lookup = dataset.lookup();
        let mut drill = UtmDrilldown::new();
        for value in selections {
            drill.select(value.as_str())?;
        }
        Ok(DrilldownView {
            breadcrumbs: drill.breadcrumbs().to_vec(),
            level: drill.current_level(),
            working_rows: drill.working_set(&dataset.sales, &lookup).len(),
            entries: drill.current_breakdown(&dataset.sales, &lookup),
        })
    }

    pub async fn integrity(&self) -> CuboResult<IntegrityReport> {
        let dataset = self.full_dataset().await?;
        Ok(integrity_report(&dataset.funnels, &dataset.offer_mappings))
    }
}

impl Pipeline<MemorySource> {
    /// Pipeline over the JSON tables in `dir`.
    pub fn from_data_dir(dir: &Path, config: AppConfig, project_id: impl Into<String>) -> CuboResult<Self> {
        if !dir.is_dir() {
            return Err(CuboError::Config(format!(
                "Data directory not found: {}",
                dir.display()
            )));
        }
        Ok(Self::new(load_data_dir(dir)?, config, project_id))
    }
}
