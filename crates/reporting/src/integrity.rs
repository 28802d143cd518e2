//! Offer/funnel integrity diagnostics — dangling funnel references, missing
//! fields, duplicated offers and auto-imported placeholder names.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use cubo_core::types::{non_blank, Funnel, OfferMapping};

const SAMPLE_LIMIT: usize = 10;
const EMPTY_ORIGIN: &str = "(vazio)";
const GENERIC_OFFER_NAMES: [&str; 3] = [
    "auto-importado",
    "auto-importado de vendas existentes",
    "importado das vendas",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityTotals {
    pub funnels: usize,
    pub offers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityCounts {
    pub offers_missing_funnel_id: usize,
    pub offers_with_invalid_funnel_id: usize,
    pub offers_missing_project_id: usize,
    pub offers_missing_product_name: usize,
    pub offers_missing_offer_name: usize,
    pub funnels_without_offers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSummary {
    pub groups: usize,
    pub extra_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticCounts {
    pub generic_offer_names: usize,
    pub by_origin: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelSample {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroupSample {
    pub count: usize,
    pub project_id: String,
    pub funnel_id: String,
    pub product_name: String,
    pub offer_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegritySamples {
    pub invalid_funnel_ids: BTreeMap<String, usize>,
    pub funnels_without_offers: Vec<FunnelSample>,
    pub top_duplicate_groups: Vec<DuplicateGroupSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub totals: IntegrityTotals,
    pub integrity: IntegrityCounts,
    pub duplicates: DuplicateSummary,
    pub semantics: SemanticCounts,
    pub samples: IntegritySamples,
}

/// Trim, lower-case and collapse runs of whitespace.
fn normalize(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_missing(value: Option<&str>) -> bool {
    non_blank(value).is_none()
}

pub fn integrity_report(funnels: &[Funnel], offers: &[OfferMapping]) -> IntegrityReport {
    let funnel_ids: HashSet<&str> = funnels.iter().map(|f| f.id.as_str()).collect();

    let mut invalid_funnel_ids: BTreeMap<String, usize> = BTreeMap::new();
    let mut offers_by_funnel: HashSet<&str> = HashSet::new();
    let mut duplicate_groups: BTreeMap<(String, String, String, String), Vec<&OfferMapping>> =
        BTreeMap::new();
    let mut by_origin: BTreeMap<String, usize> = BTreeMap::new();
    let mut generic_offer_names = 0;

    for offer in offers {
        if let Some(funnel_id) = non_blank(offer.funnel_id.as_deref()) {
            offers_by_funnel.insert(funnel_id);
            if !funnel_ids.contains(funnel_id) {
                *invalid_funnel_ids.entry(funnel_id.to_string()).or_default() += 1;
            }
        }

        let key = (
            normalize(offer.project_id.as_deref()),
            normalize(offer.funnel_id.as_deref()),
            normalize(offer.product_name.as_deref()),
            normalize(offer.offer_name.as_deref()),
        );
        duplicate_groups.entry(key).or_default().push(offer);

        if GENERIC_OFFER_NAMES.contains(&normalize(offer.offer_name.as_deref()).as_str()) {
            generic_offer_names += 1;
        }

        let origin = non_blank(offer.origin.as_deref()).unwrap_or(EMPTY_ORIGIN);
        *by_origin.entry(origin.to_string()).or_default() += 1;
    }

    let funnels_without_offers: Vec<&Funnel> = funnels
        .iter()
        .filter(|f| !offers_by_funnel.contains(f.id.as_str()))
        .collect();

    let mut duplicates: Vec<Vec<&OfferMapping>> = duplicate_groups
        .into_values()
        .filter(|rows| rows.len() > 1)
        .collect();
    duplicates.sort_by(|a, b| b.len().cmp(&a.len()));

    let report = IntegrityReport {
        totals: IntegrityTotals {
            funnels: funnels.len(),
            offers: offers.len(),
        },
        integrity: IntegrityCounts {
            offers_missing_funnel_id: offers
                .iter()
                .filter(|o| is_missing(o.funnel_id.as_deref()))
                .count(),
            offers_with_invalid_funnel_id: invalid_funnel_ids.values().sum(),
            offers_missing_project_id: offers
                .iter()
                .filter(|o| is_missing(o.project_id.as_deref()))
                .count(),
            offers_missing_product_name: offers
                .iter()
                .filter(|o| is_missing(o.product_name.as_deref()))
                .count(),
            offers_missing_offer_name: offers
                .iter()
                .filter(|o| is_missing(o.offer_name.as_deref()))
                .count(),
            funnels_without_offers: funnels_without_offers.len(),
        },
        duplicates: DuplicateSummary {
            groups: duplicates.len(),
            extra_rows: duplicates.iter().map(|rows| rows.len() - 1).sum(),
        },
        semantics: SemanticCounts {
            generic_offer_names,
            by_origin,
        },
        samples: IntegritySamples {
            invalid_funnel_ids,
            funnels_without_offers: funnels_without_offers
                .iter()
                .take(SAMPLE_LIMIT)
                .map(|f| FunnelSample {
                    id: f.id.clone(),
                    name: f.name.clone(),
                })
                .collect(),
            top_duplicate_groups: duplicates
                .iter()
                .take(SAMPLE_LIMIT)
                .map(|rows| {
                    let first = rows[0];
                    DuplicateGroupSample {
                        count: rows.len(),
                        project_id: first.project_id.clone().unwrap_or_default(),
                        funnel_id: first.funnel_id.clone().unwrap_or_default(),
                        product_name: first.product_name.clone().unwrap_or_default(),
                        offer_name: first.offer_name.clone().unwrap_or_default(),
                    }
                })
                .collect(),
        },
    };

    info!(
        funnels = report.totals.funnels,
        offers = report.totals.offers,
        invalid_funnel_refs = report.integrity.offers_with_invalid_funnel_id,
        duplicate_groups = report.duplicates.groups,
        "Built offer integrity report"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_offer(
        id: &str,
        funnel: Option<&str>,
        product: Option<&str>,
        name: Option<&str>,
        origin: Option<&str>,
    ) -> OfferMapping {
        OfferMapping {
            id: id.to_string(),
            project_id: Some("p1".to_string()),
            funnel_id: funnel.map(str::to_string),
            offer_code: Some(format!("CODE-{}", id)),
            product_name: product.map(str::to_string),
            offer_name: name.map(str::to_string),
            position: None,
            legacy_funnel_name: None,
            origin: origin.map(str::to_string),
        }
    }

    fn make_funnel(id: &str, name: &str) -> Funnel {
        Funnel {
            id: id.to_string(),
            project_id: Some("p1".to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_counts_missing_and_invalid_references() {
        let funnels = vec![make_funnel("f1", "Perpétuo"), make_funnel("f2", "Sem ofertas")];
        let offers = vec![
            make_offer("1", Some("f1"), Some("Curso"), Some("Oferta A"), Some("hotmart")),
            make_offer("2", Some("ghost"), Some("Curso"), Some("Oferta B"), None),
            make_offer("3", Some("ghost"), None, None, Some(" ")),
            make_offer("4", None, Some("Ebook"), Some("Oferta C"), Some("hotmart")),
        ];
        let report = integrity_report(&funnels, &offers);

        assert_eq!(report.totals.funnels, 2);
        assert_eq!(report.totals.offers, 4);
        assert_eq!(report.integrity.offers_missing_funnel_id, 1);
        assert_eq!(report.integrity.offers_with_invalid_funnel_id, 2);
        assert_eq!(report.integrity.offers_missing_product_name, 1);
        assert_eq!(report.integrity.offers_missing_offer_name, 1);
        assert_eq!(report.integrity.offers_missing_project_id, 0);
        assert_eq!(report.integrity.funnels_without_offers, 1);
        assert_eq!(report.samples.invalid_funnel_ids.get("ghost"), Some(&2));
        assert_eq!(report.samples.funnels_without_offers[0].id, "f2");
        assert_eq!(report.semantics.by_origin.get("hotmart"), Some(&2));
        assert_eq!(report.semantics.by_origin.get(EMPTY_ORIGIN), Some(&2));
    }

    #[test]
    fn test_duplicates_use_normalized_key() {
        let funnels = vec![make_funnel("f1", "Perpétuo")];
        let offers = vec![
            make_offer("1", Some("f1"), Some("Curso  Completo"), Some("Oferta"), None),
            make_offer("2", Some("f1"), Some("curso completo "), Some("OFERTA"), None),
            make_offer("3", Some("f1"), Some("Curso Completo"), Some("oferta"), None),
            make_offer("4", Some("f1"), Some("Ebook"), Some("x"), None),
            make_offer("5", Some("f1"), Some("Ebook"), Some("X"), None),
        ];
        let report = integrity_report(&funnels, &offers);

        assert_eq!(report.duplicates.groups, 2);
        assert_eq!(report.duplicates.extra_rows, 3);
        assert_eq!(report.samples.top_duplicate_groups[0].count, 3);
        assert_eq!(report.samples.top_duplicate_groups[0].product_name, "Curso  Completo");
    }

    #[test]
    fn test_generic_offer_names_detected() {
        let offers = vec![
            make_offer("1", None, None, Some("Auto-importado"), None),
            make_offer("2", None, None, Some("  importado   das vendas"), None),
            make_offer("3", None, None, Some("Oferta Black Friday"), None),
        ];
        let report = integrity_report(&[], &offers);
        assert_eq!(report.semantics.generic_offer_names, 2);
    }
}
