//! Pure merge step over the resolver's output.
//!
//! An RFQ re-resolved mid-poll can hand back the same lift twice; offers
//! referencing the same quote collapse to their first occurrence so
//! repeated polling never double-counts.

use std::collections::HashSet;

use crate::models::offer::FlightOffer;

#[derive(Debug)]
pub struct AggregatedOffers {
    pub offers: Vec<FlightOffer>,
    /// Offers with a terminal priced status.
    pub quotes_received: usize,
    /// Invited operators (one per RFQ), answered or not.
    pub quotes_expected: usize,
}

pub fn aggregate(offers: Vec<FlightOffer>, total_quotes: usize) -> AggregatedOffers {
    let mut seen = HashSet::new();
    let mut deduped: Vec<FlightOffer> = Vec::with_capacity(offers.len());
    for offer in offers {
        if seen.insert(offer.dedup_key()) {
            deduped.push(offer);
        }
    }

    let quotes_received = deduped.iter().filter(|o| o.is_priced()).count();

    AggregatedOffers {
        offers: deduped,
        quotes_received,
        quotes_expected: total_quotes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(rfq_id: &str, quote_id: Option<&str>, lift_index: usize, status: &str) -> FlightOffer {
        FlightOffer {
            rfq_id: rfq_id.into(),
            quote_id: quote_id.map(str::to_string),
            lift_index,
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
    fn duplicate_quote_ids_collapse() {
        let merged = aggregate(
            vec![
                offer("arfq-1", Some("42"), 0, "quoted"),
                offer("arfq-1", Some("42"), 0, "quoted"),
                offer("arfq-2", Some("43"), 0, "quoted"),
            ],
            2,
        );
        assert_eq!(merged.offers.len(), 2);
        assert_eq!(merged.quotes_received, 2);
        assert_eq!(merged.quotes_expected, 2);
    }

    #[test]
    fn offers_without_quote_ids_dedup_by_lift_position() {
        let merged = aggregate(
            vec![
                offer("arfq-1", None, 0, "quoted"),
                offer("arfq-1", None, 0, "quoted"),
                offer("arfq-1", None, 1, "quoted"),
            ],
            1,
        );
        assert_eq!(merged.offers.len(), 2);
    }

    #[test]
    fn unpriced_statuses_do_not_count_as_received() {
        let merged = aggregate(
            vec![
                offer("arfq-1", Some("42"), 0, "quoted"),
                offer("arfq-2", Some("43"), 0, "declined"),
            ],
            3,
        );
        assert_eq!(merged.offers.len(), 2);
        assert_eq!(merged.quotes_received, 1);
        assert_eq!(merged.quotes_expected, 3);
    }

    #[test]
    fn first_occurrence_order_is_preserved() {
        let merged = aggregate(
            vec![
                offer("arfq-2", Some("43"), 0, "quoted"),
                offer("arfq-1", Some("42"), 0, "quoted"),
                offer("arfq-2", Some("43"), 0, "quoted"),
            ],
            2,
        );
        let keys: Vec<_> = merged.offers.iter().map(|o| o.quote_id.clone().unwrap()).collect();
        assert_eq!(keys, ["43", "42"]);
    }
}
