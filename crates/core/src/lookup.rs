//! Mapping resolver — immutable offer→funnel and funnel→name lookups built
//! from the small reference tables.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{non_blank, Funnel, OfferMapping};

/// Read-only lookup tables passed explicitly into every aggregation.
#[derive(Debug, Clone, Default)]
pub struct OfferLookup {
    offer_to_funnel: HashMap<String, String>,
    offer_to_position: HashMap<String, String>,
    offer_to_product: HashMap<String, String>,
    funnel_names: HashMap<String, String>,
}

impl OfferLookup {
    /// Build the lookups. When two mappings share an offer code the first one wins.
    pub fn build(mappings: &[OfferMapping], funnels: &[Funnel]) -> Self {
        let mut lookup = Self::default();

        for funnel in funnels {
            lookup
                .funnel_names
                .entry(funnel.id.clone())
                .or_insert_with(|| funnel.name.clone());
        }

        for mapping in mappings {
            let Some(code) = non_blank(mapping.offer_code.as_deref()) else {
                continue;
            };
            if let Some(funnel_id) = non_blank(mapping.funnel_id.as_deref()) {
                lookup
                    .offer_to_funnel
                    .entry(code.to_string())
                    .or_insert_with(|| funnel_id.to_string());
            }
            if let Some(position) = non_blank(mapping.position.as_deref()) {
                lookup
                    .offer_to_position
                    .entry(code.to_string())
                    .or_insert_with(|| position.to_string());
            }
            if let Some(product) = non_blank(mapping.product_name.as_deref()) {
                lookup
                    .offer_to_product
                    .entry(code.to_string())
                    .or_insert_with(|| product.to_string());
            }
        }

        debug!(
            offers = lookup.offer_to_funnel.len(),
            funnels = lookup.funnel_names.len(),
            "Built offer lookup"
        );
        lookup
    }

    pub fn funnel_for_offer(&self, offer_code: &str) -> Option<&str> {
        self.offer_to_funnel.get(offer_code).map(String::as_str)
    }

    pub fn funnel_name(&self, funnel_id: &str) -> Option<&str> {
        self.funnel_names.get(funnel_id).map(String::as_str)
    }

    pub fn funnel_name_for_offer(&self, offer_code: &str) -> Option<&str> {
        self.funnel_for_offer(offer_code)
            .and_then(|id| self.funnel_name(id))
    }

    pub fn position_for_offer(&self, offer_code: &str) -> Option<&str> {
        self.offer_to_position.get(offer_code).map(String::as_str)
    }

    pub fn product_for_offer(&self, offer_code: &str) -> Option<&str> {
        self.offer_to_product.get(offer_code).map(String::as_str)
    }

    /// Number of offer codes with a resolvable funnel.
    pub fn offer_count(&self) -> usize {
        self.offer_to_funnel.len()
    }

    pub fn funnel_count(&self) -> usize {
        self.funnel_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_mapping(id: &str, code: Option<&str>, funnel: Option<&str>) -> OfferMapping {
        OfferMapping {
            id: id.to_string(),
            project_id: Some("p1".to_string()),
            funnel_id: funnel.map(str::to_string),
            offer_code: code.map(str::to_string),
            product_name: Some(format!("Produto {}", id)),
            offer_name: None,
            position: Some("FRONT".to_string()),
            legacy_funnel_name: None,
            origin: None,
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
    fn test_resolves_offer_to_funnel_name() {
        let lookup = OfferLookup::build(
            &[make_mapping("m1", Some("OF1"), Some("f1"))],
            &[make_funnel("f1", "Lançamento Março")],
        );
        assert_eq!(lookup.funnel_for_offer("OF1"), Some("f1"));
        assert_eq!(lookup.funnel_name_for_offer("OF1"), Some("Lançamento Março"));
        assert_eq!(lookup.position_for_offer("OF1"), Some("FRONT"));
        assert_eq!(lookup.product_for_offer("OF1"), Some("Produto m1"));
        assert_eq!(lookup.funnel_for_offer("OF2"), None);
    }

    #[test]
    fn test_first_mapping_wins_on_duplicate_code() {
        let lookup = OfferLookup::build(
            &[
                make_mapping("m1", Some("OF1"), Some("f1")),
                make_mapping("m2", Some("OF1"), Some("f2")),
            ],
            &[],
        );
        assert_eq!(lookup.funnel_for_offer("OF1"), Some("f1"));
        assert_eq!(lookup.offer_count(), 1);
    }

    #[test]
    fn test_mappings_without_code_or_funnel_are_ignored() {
        let lookup = OfferLookup::build(
            &[
                make_mapping("m1", None, Some("f1")),
                make_mapping("m2", Some("OF2"), None),
                make_mapping("m3", Some("  "), Some("f3")),
            ],
            &[make_funnel("f1", "A")],
        );
        assert_eq!(lookup.offer_count(), 0);
        assert_eq!(lookup.funnel_for_offer("OF2"), None);
        assert_eq!(lookup.funnel_count(), 1);
    }
}
