use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use cubo_core::fetch::{
    MemorySource, PageSource, RowQuery, CONTACTS_TABLE, FUNNELS_TABLE, OFFER_MAPPINGS_TABLE,
    SALES_TABLE,
};
use cubo_core::{AppConfig, CuboResult};
use cubo_journey::types::{JourneyFilter, JourneyQuery};
use cubo_magico::{load_data_dir, Pipeline};
use cubo_reporting::attribution::UtmDimension;
use cubo_reporting::breakdown::BreakdownDimension;
use cubo_reporting::drilldown::UtmLevel;

fn make_sale(id: &str, email: &str, offer: &str, product: &str, amount: f64, date: &str, status: &str) -> Value {
    let campaign = if offer == "OF1" { "lancamento" } else { "perpetuo" };
    json!({
        "transaction_id": id,
        "project_id": "proj-1",
        "buyer_email": email,
        "offer_code": offer,
        "product_name": product,
        "amount": amount,
        "sale_date": date,
        "status": status,
        "utm_source": "facebook",
        "utm_campaign": campaign,
    })
}

fn sales() -> Vec<Value> {
    vec![
        make_sale("T1", "a@x.com", "OF1", "Curso", 100.0, "2024-02-01T10:00:00Z", "APPROVED"),
        make_sale("T2", "A@X.com ", "OF2", "Mentoria", 50.0, "2024-02-03T10:00:00Z", "COMPLETE"),
        make_sale("T3", "b@x.com", "OF1", "Curso", 100.0, "2024-02-05T10:00:00Z", "APPROVED"),
        make_sale("T4", "c@x.com", "OF2", "Mentoria", 50.0, "2024-02-06T10:00:00Z", "REFUNDED"),
        json!({
            "transaction_id": "OTHER",
            "project_id": "proj-2",
            "buyer_email": "z@x.com",
            "sale_date": "2024-02-01T10:00:00Z",
            "amount": 999.0,
            "status": "APPROVED",
        }),
    ]
}

fn mappings() -> Vec<Value> {
    vec![
        json!({"id": "m1", "project_id": "proj-1", "funnel_id": "F1", "offer_code": "OF1",
               "product_name": "Curso", "offer_name": "Oferta principal", "position": "FRONT"}),
        json!({"id": "m2", "project_id": "proj-1", "funnel_id": "F2", "offer_code": "OF2",
               "product_name": "Mentoria", "offer_name": "Auto-importado", "position": "FRONT"}),
        json!({"id": "m3", "project_id": "proj-1", "funnel_id": "GONE", "offer_code": "OF3",
               "product_name": "Ebook", "offer_name": "Ebook"}),
    ]
}

fn funnels() -> Vec<Value> {
    vec![
        json!({"id": "F1", "project_id": "proj-1", "name": "Lançamento"}),
        json!({"id": "F2", "project_id": "proj-1", "name": "Perpétuo"}),
        json!({"id": "F3", "project_id": "proj-1", "name": "Vazio"}),
    ]
}

fn contacts() -> Vec<Value> {
    vec![
        json!({"id": "k1", "project_id": "proj-1", "is_customer": true, "total_revenue": 150.0,
               "purchase_count": 2, "utm_source": "facebook",
               "first_seen_at": "2024-01-30T10:00:00Z", "first_purchase_at": "2024-02-01T10:00:00Z"}),
        json!({"id": "k2", "project_id": "proj-1", "is_customer": false, "total_revenue": 0.0,
               "purchase_count": 0, "utm_source": "facebook"}),
        json!({"id": "k3", "project_id": "proj-1", "is_customer": true, "total_revenue": 100.0,
               "purchase_count": 1}),
    ]
}

fn make_source() -> MemorySource {
    MemorySource::new()
        .with_table(SALES_TABLE, sales())
        .with_table(OFFER_MAPPINGS_TABLE, mappings())
        .with_table(FUNNELS_TABLE, funnels())
        .with_table(CONTACTS_TABLE, contacts())
}

fn make_pipeline() -> Pipeline<MemorySource> {
    let mut config = AppConfig::default();
    // Small pages so every read spans several requests.
    config.fetch.page_size = 2;
    Pipeline::new(make_source(), config, "proj-1")
}

#[tokio::test]
async fn test_journeys_use_paid_sales_only() {
    let report = make_pipeline()
        .journeys(&JourneyQuery::default(), None)
        .await
        .unwrap();

    assert_eq!(report.summary.total_customers, 2);
    let first = &report.journeys[0];
    assert_eq!(first.email, "a@x.com");
    assert_eq!(first.total_spent, 150.0);
    assert_eq!(first.total_purchases, 2);
    assert_eq!(first.entry_product.as_deref(), Some("Curso"));
    assert_eq!(first.entry_funnel_name.as_deref(), Some("Lançamento"));
    assert_eq!(first.subsequent_products, vec!["Mentoria".to_string()]);
    assert_eq!(first.avg_days_between_purchases, Some(2.0));
    assert_eq!(report.flows.len(), 1);
}

#[tokio::test]
async fn test_journeys_entry_filter_and_limit() {
    let pipeline = make_pipeline();
    let query = JourneyQuery {
        entry: Some(JourneyFilter::Funnel("F1".to_string())),
        ..Default::default()
    };
    let report = pipeline.journeys(&query, Some(1)).await.unwrap();
    assert_eq!(report.summary.total_customers, 2);
    assert_eq!(report.journeys.len(), 1);
}

#[tokio::test]
async fn test_breakdowns_cover_every_status() {
    let pipeline = make_pipeline();
    let result = pipeline
        .breakdowns(&[BreakdownDimension::Status, BreakdownDimension::Funnel])
        .await
        .unwrap();
    assert_eq!(result[0].total_rows, 4);
    let funnel = &result[1];
    assert_eq!(funnel.entries[0].count, 2);
    assert!(funnel.entries.iter().any(|e| e.label == "Perpétuo"));

    let defaults = pipeline.default_dimensions().unwrap();
    assert_eq!(defaults[0], BreakdownDimension::Status);
}

#[tokio::test]
async fn test_cohorts_and_attribution() {
    let pipeline = make_pipeline();
    let cohorts = pipeline.cohorts().await.unwrap();
    assert_eq!(cohorts[0].cohort_key, "F1");
    assert_eq!(cohorts[0].customer_count, 2);

    let rows = pipeline.attribution(UtmDimension::Source).await.unwrap();
    assert_eq!(rows[0].value, "facebook");
    assert_eq!(rows[0].total_contacts, 2);
    assert_eq!(rows[0].conversion_rate, 50.0);
    assert_eq!(rows[0].avg_days_to_purchase, Some(2.0));
}

#[tokio::test]
async fn test_drilldown_and_integrity() {
    let pipeline = make_pipeline();
    let view = pipeline.drilldown(&["facebook".to_string()]).await.unwrap();
    assert_eq!(view.level, Some(UtmLevel::Campaign));
    assert_eq!(view.working_rows, 4);
    assert_eq!(view.entries[0].key, "lancamento");

    let too_deep: Vec<String> = (0..6).map(|i| i.to_string()).collect();
    assert!(pipeline.drilldown(&too_deep).await.is_err());

    let report = pipeline.integrity().await.unwrap();
    assert_eq!(report.totals.offers, 3);
    assert_eq!(report.integrity.offers_with_invalid_funnel_id, 1);
    assert_eq!(report.integrity.funnels_without_offers, 1);
    assert_eq!(report.semantics.generic_offer_names, 1);
}

#[tokio::test]
async fn test_load_data_dir_reads_json_tables() {
    let dir: PathBuf = std::env::temp_dir().join(format!("cubo-magico-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("sales.json"), serde_json::to_string(&sales()).unwrap()).unwrap();
    std::fs::write(dir.join("funnels.json"), serde_json::to_string(&funnels()).unwrap()).unwrap();

    let source = load_data_dir(&dir).unwrap();
    assert_eq!(source.table_len(SALES_TABLE), 5);
    assert_eq!(source.table_len(OFFER_MAPPINGS_TABLE), 0);

    let pipeline = Pipeline::from_data_dir(&dir, AppConfig::default(), "proj-1").unwrap();
    let report = pipeline.journeys(&JourneyQuery::default(), None).await.unwrap();
    assert_eq!(report.summary.total_customers, 2);
    assert!(report.journeys[0].entry_funnel_id.is_none());

    std::fs::remove_dir_all(&dir).unwrap();
    assert!(Pipeline::from_data_dir(&dir, AppConfig::default(), "proj-1").is_err());
}

/// Store whose tables can change between reads.
#[derive(Clone, Default)]
struct SharedSource(Arc<Mutex<MemorySource>>);

impl SharedSource {
    fn set_sales(&self, rows: Vec<Value>) {
        self.0.lock().unwrap().insert_table(SALES_TABLE, rows);
    }
}

impl PageSource for SharedSource {
    async fn fetch_page(&self, query: &RowQuery, offset: usize, limit: usize) -> CuboResult<Vec<Value>> {
        let snapshot = self.0.lock().unwrap().clone();
        snapshot.fetch_page(query, offset, limit).await
    }
}

#[tokio::test]
async fn test_journeys_follow_store_changes() {
    let store = SharedSource(Arc::new(Mutex::new(make_source())));
    store.set_sales(sales()[..1].to_vec());
    let pipeline = Pipeline::new(store.clone(), AppConfig::default(), "proj-1");

    let before = pipeline.journeys(&JourneyQuery::default(), None).await.unwrap();
    assert_eq!(before.summary.total_customers, 1);
    let cohorts_before = pipeline.cohorts().await.unwrap();
    assert_eq!(cohorts_before[0].customer_count, 1);

    store.set_sales(sales());
    let after = pipeline.journeys(&JourneyQuery::default(), None).await.unwrap();
    assert_eq!(after.summary.total_customers, 2);
    let cohorts_after = pipeline.cohorts().await.unwrap();
    assert_eq!(cohorts_after[0].customer_count, 2);

    // Unchanged rows are served again without re-aggregating.
    let again = pipeline.journeys(&JourneyQuery::default(), None).await.unwrap();
    assert_eq!(again.summary.total_customers, 2);
}

#[tokio::test]
async fn test_reload_replaces_source() {
    let mut pipeline = make_pipeline();
    assert_eq!(
        pipeline.journeys(&JourneyQuery::default(), None).await.unwrap().summary.total_customers,
        2
    );

    pipeline.reload(make_source().with_table(SALES_TABLE, sales()[..1].to_vec()));
    let report = pipeline.journeys(&JourneyQuery::default(), None).await.unwrap();
    assert_eq!(report.summary.total_customers, 1);
}

#[tokio::test]
async fn test_lowercase_paid_status_counts_as_revenue() {
    let rows = vec![
        make_sale("T1", "a@x.com", "OF1", "Curso", 100.0, "2024-02-01T10:00:00Z", "approved"),
        make_sale("T2", "b@x.com", "OF2", "Mentoria", 50.0, "2024-02-03T10:00:00Z", "Complete"),
        make_sale("T3", "c@x.com", "OF2", "Mentoria", 50.0, "2024-02-04T10:00:00Z", "refunded"),
    ];
    let source = make_source().with_table(SALES_TABLE, rows);
    let pipeline = Pipeline::new(source, AppConfig::default(), "proj-1");

    let report = pipeline.journeys(&JourneyQuery::default(), None).await.unwrap();
    assert_eq!(report.summary.total_customers, 2);
    assert_eq!(report.summary.total_revenue, 150.0);
}
