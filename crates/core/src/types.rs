use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket label used wherever a grouping key is missing.
pub const UNDEFINED_LABEL: &str = "(não definido)";

/// Payment status of a sale as reported by the checkout platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SaleStatus {
    Approved,
    Complete,
    Canceled,
    Refunded,
    Chargeback,
    Expired,
    WaitingPayment,
    PrintedBillet,
    Dispute,
    Blocked,
    Overdue,
    /// Any status the label table does not know, kept verbatim.
    Other(String),
}

impl SaleStatus {
    /// Upper-case key as stored by the checkout platform.
    pub fn key(&self) -> &str {
        match self {
            SaleStatus::Approved => "APPROVED",
            SaleStatus::Complete => "COMPLETE",
            SaleStatus::Canceled => "CANCELED",
            SaleStatus::Refunded => "REFUNDED",
            SaleStatus::Chargeback => "CHARGEBACK",
            SaleStatus::Expired => "EXPIRED",
            SaleStatus::WaitingPayment => "WAITING_PAYMENT",
            SaleStatus::PrintedBillet => "PRINTED_BILLET",
            SaleStatus::Dispute => "DISPUTE",
            SaleStatus::Blocked => "BLOCKED",
            SaleStatus::Overdue => "OVERDUE",
            SaleStatus::Other(raw) => raw,
        }
    }

    /// Human label shown on dashboard cards. Unknown statuses fall back to the raw key.
    pub fn label(&self) -> &str {
        match self {
            SaleStatus::Approved => "Aprovado",
            SaleStatus::Complete => "Completo",
            SaleStatus::Canceled => "Cancelado",
            SaleStatus::Refunded => "Reembolsado",
            SaleStatus::Chargeback => "Chargeback",
            SaleStatus::Expired => "Expirado",
            SaleStatus::WaitingPayment => "Aguardando pagamento",
            SaleStatus::PrintedBillet => "Boleto impresso",
            SaleStatus::Dispute => "Em disputa",
            SaleStatus::Blocked => "Bloqueado",
            SaleStatus::Overdue => "Atrasado",
            SaleStatus::Other(raw) => raw,
        }
    }

    /// Statuses that count as revenue.
    pub fn is_paid(&self) -> bool {
        matches!(self, SaleStatus::Approved | SaleStatus::Complete)
    }
}

impl From<String> for SaleStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => SaleStatus::Approved,
            "COMPLETE" | "COMPLETED" => SaleStatus::Complete,
            "CANCELED" | "CANCELLED" => SaleStatus::Canceled,
            "REFUNDED" => SaleStatus::Refunded,
            "CHARGEBACK" => SaleStatus::Chargeback,
            "EXPIRED" => SaleStatus::Expired,
            "WAITING_PAYMENT" => SaleStatus::WaitingPayment,
            "PRINTED_BILLET" => SaleStatus::PrintedBillet,
            "DISPUTE" => SaleStatus::Dispute,
            "BLOCKED" => SaleStatus::Blocked,
            "OVERDUE" => SaleStatus::Overdue,
            _ => SaleStatus::Other(raw),
        }
    }
}

impl From<&str> for SaleStatus {
    fn from(raw: &str) -> Self {
        SaleStatus::from(raw.to_string())
    }
}

impl From<SaleStatus> for String {
    fn from(status: SaleStatus) -> Self {
        status.key().to_string()
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Immutable sale fact row as read from the `sales` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub transaction_id: String,
    pub project_id: String,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub offer_code: Option<String>,
    pub sale_date: DateTime<Utc>,
    #[serde(default)]
    pub amount: f64,
    pub status: SaleStatus,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_adset: Option<String>,
    #[serde(default)]
    pub utm_creative: Option<String>,
    #[serde(default)]
    pub utm_placement: Option<String>,
}

impl SaleRecord {
    /// Identity key of the buyer: trimmed, lower-cased email.
    pub fn identity(&self) -> Option<String> {
        normalize_email(self.buyer_email.as_deref())
    }
}

/// Maps a checkout offer code onto a funnel and its position in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferMapping {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub funnel_id: Option<String>,
    #[serde(default)]
    pub offer_code: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub offer_name: Option<String>,
    /// Position in the funnel, e.g. FRONT, OB1, US1, DS1.
    #[serde(default)]
    pub position: Option<String>,
    /// Funnel name from before funnels had ids.
    #[serde(default)]
    pub legacy_funnel_name: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Funnel {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub name: String,
}

/// CRM contact with first-touch UTM attribution and purchase totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtmContact {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_purchase_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_customer: bool,
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub purchase_count: u32,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_adset: Option<String>,
    #[serde(default)]
    pub utm_ad: Option<String>,
    #[serde(default)]
    pub utm_creative: Option<String>,
}

/// Inclusive date window. An open bound matches everything on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Trim and lower-case an email. Empty values have no identity.
pub fn normalize_email(email: Option<&str>) -> Option<String> {
    let email = email?.trim();
    if email.is_empty() {
        None
    } else {
        Some(email.to_lowercase())
    }
}

/// Treat blank strings the same as missing ones.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!(SaleStatus::from("approved"), SaleStatus::Approved);
        assert_eq!(SaleStatus::from("CANCELLED"), SaleStatus::Canceled);
        assert_eq!(
            SaleStatus::from("UNDER_ANALISYS"),
            SaleStatus::Other("UNDER_ANALISYS".to_string())
        );
    }

    #[test]
    fn test_status_labels_fall_back_to_raw_key() {
        assert_eq!(SaleStatus::Approved.label(), "Aprovado");
        assert_eq!(SaleStatus::Refunded.label(), "Reembolsado");
        assert_eq!(SaleStatus::from("NO_FUNDS").label(), "NO_FUNDS");
    }

    #[test]
    fn test_status_serde_uses_upper_case_key() {
        let json = serde_json::to_string(&SaleStatus::WaitingPayment).unwrap();
        assert_eq!(json, "\"WAITING_PAYMENT\"");
        let parsed: SaleStatus = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(parsed, SaleStatus::Complete);
    }

    #[test]
    fn test_sale_identity_normalizes_email() {
        let row: SaleRecord = serde_json::from_value(serde_json::json!({
            "transaction_id": "HP1",
            "project_id": "p1",
            "buyer_email": "  Ana@Example.COM ",
            "sale_date": "2024-03-01T12:00:00Z",
            "amount": 97.0,
            "status": "APPROVED"
        }))
        .unwrap();
        assert_eq!(row.identity().as_deref(), Some("ana@example.com"));
        assert!(row.status.is_paid());
        assert!(row.offer_code.is_none());
    }

    #[test]
    fn test_blank_email_has_no_identity() {
        assert_eq!(normalize_email(Some("   ")), None);
        assert_eq!(normalize_email(None), None);
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let range = DateRange::new(Some(start), Some(end));
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
        assert!(DateRange::default().contains(start));
    }
}
