use serde::{Deserialize, Serialize};

/// Statuses that count as a priced, terminal operator response.
const PRICED_STATUSES: &[&str] = &["quoted", "accepted", "confirmed", "booked"];

/// Normalized projection of one resolved Lift+Quote pair. This is the
/// unit the rest of the application consumes; it only exists in memory
/// and in API responses, never as its own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub rfq_id: String,
    /// Bare numeric quote id, when the lift carried or referenced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
    pub lift_index: usize,
    pub operator: String,
    pub aircraft_type: String,
    pub aircraft_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aircraft_tail: Option<String>,
    pub total_price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_latency_minutes: Option<i64>,
    pub status: String,
}

impl FlightOffer {
    /// Key the aggregator deduplicates on: the quote identifier when one
    /// exists, otherwise the (rfq, lift position) pair.
    pub fn dedup_key(&self) -> String {
        match &self.quote_id {
            Some(quote_id) => format!("quote:{}", quote_id),
            None => format!("lift:{}:{}", self.rfq_id, self.lift_index),
        }
    }

    pub fn is_priced(&self) -> bool {
        PRICED_STATUSES.contains(&self.status.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(quote_id: Option<&str>, status: &str) -> FlightOffer {
        FlightOffer {
            rfq_id: "arfq-1".into(),
            quote_id: quote_id.map(str::to_string),
            lift_index: 0,
            operator: "Acme Jets".into(),
            aircraft_type: "Citation XLS".into(),
            aircraft_category: "Midsize jet".into(),
            aircraft_tail: None,
            total_price: 10_000.0,
            currency: "USD".into(),
            response_latency_minutes: None,
            status: status.into(),
        }
    }

    #[test]
    fn dedup_key_prefers_quote_id() {
        assert_eq!(offer(Some("42"), "quoted").dedup_key(), "quote:42");
        assert_eq!(offer(None, "quoted").dedup_key(), "lift:arfq-1:0");
    }

    #[test]
    fn declined_offers_are_not_priced() {
        assert!(offer(None, "quoted").is_priced());
        assert!(!offer(None, "declined").is_priced());
        assert!(!offer(None, "unanswered").is_priced());
    }
}
