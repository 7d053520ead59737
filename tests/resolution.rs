//! End-to-end resolution scenarios driven through the mock marketplace:
//! resolve → aggregate → deep link → workflow recomputation, without a
//! live upstream or database.

use serde_json::json;

use trip_engine::models::session::WorkflowStep;
use trip_engine::services::{aggregator, deep_link, resolver, workflow};
use trip_engine::testing::{MockFailure, MockGateway};

const DEEP_LINK: &str = "https://sandbox.avinode.com/marketplace/mvc/trips/selection/65262230";

fn mixed_trip() -> serde_json::Value {
    // Three invited operators: one answered inline, one behind a quote
    // reference, one still silent.
    json!({
        "id": "atrip-65262230",
        "createdDate": "2026-08-01T10:00:00+00:00",
        "actions": {"searchInAvinode": {"href": DEEP_LINK}},
        "segments": [{
            "startAirport": {"icao": "KTEB"},
            "endAirport": {"icao": "KMIA"},
            "dateTime": {"date": "2026-09-05"},
            "paxCount": "4"
        }],
        "rfqs": [
            {
                "id": "arfq-1",
                "sellerCompany": {"name": "Acme Jets"},
                "displayStatus": "Quoted",
                "receivedDate": "2026-08-01T10:45:00+00:00",
                "lifts": [{
                    "aircraftType": "Citation XLS",
                    "aircraftCategory": "Midsize jet",
                    "sellerPrice": {"amount": 10000.0, "currency": "USD"}
                }]
            },
            {
                "id": "arfq-2",
                "sellerCompany": {"name": "Blue Air"},
                "displayStatus": "Quoted",
                "lifts": [{"quoteId": "aquote-390825418"}]
            },
            {
                "id": "arfq-3",
                "sellerCompany": {"name": "Cirrus Charter"},
                "lifts": []
            }
        ]
    })
}

#[tokio::test]
async fn full_resolution_pass_over_a_mixed_trip() {
    let gateway = MockGateway::new()
        .with_trip("atrip-65262230", mixed_trip())
        // Prefixed form 404s; the bare numeric form is the one that works.
        .with_quote(
            "390825418",
            json!({
                "id": "390825418",
                "sellerPrice": {"amount": 12500.0, "currency": "USD"},
                "lift": {
                    "aircraftType": "Challenger 350",
                    "aircraftCategory": "Super midsize jet",
                    "aircraftTail": "N350BA"
                }
            }),
        );

    let resolution = resolver::resolve_trip_offers(&gateway, "atrip-65262230")
        .await
        .unwrap();

    assert_eq!(resolution.offers.len(), 2);
    assert_eq!(resolution.total_quotes, 3);
    assert!(resolution.warnings.is_empty());

    let prices: Vec<f64> = resolution.offers.iter().map(|o| o.total_price).collect();
    assert_eq!(prices, [10000.0, 12500.0]);
    assert_eq!(
        resolution.offers[0].response_latency_minutes,
        Some(45),
        "inline offer carries the operator's response latency"
    );
    assert_eq!(resolution.offers[1].aircraft_tail.as_deref(), Some("N350BA"));

    let aggregated = aggregator::aggregate(resolution.offers, resolution.total_quotes);
    assert_eq!(aggregated.quotes_received, 2);
    assert_eq!(aggregated.quotes_expected, 3);

    let link = deep_link::extract(&resolution.trip);
    assert_eq!(link.as_deref(), Some(DEEP_LINK));

    // Workflow advances to at least awaiting_selection, and past it
    // since priced quotes are in.
    let signals = workflow::WorkflowSignals {
        trip_exists: true,
        rfq_count: aggregated.quotes_expected,
        quotes_received: aggregated.quotes_received,
        deep_link_present: link.is_some(),
        ..Default::default()
    };
    let step = workflow::observe("atrip-65262230", WorkflowStep::Created, &signals);
    assert!(step.rank() >= WorkflowStep::AwaitingSelection.rank());
    assert_eq!(step, WorkflowStep::QuotesUpdating);
}

#[tokio::test]
async fn repeated_polls_converge_instead_of_double_counting() {
    let gateway = MockGateway::new()
        .with_trip("atrip-65262230", mixed_trip())
        .with_quote(
            "390825418",
            json!({"id": "390825418", "sellerPrice": {"amount": 12500.0, "currency": "USD"}}),
        );

    let first = resolver::resolve_trip_offers(&gateway, "atrip-65262230")
        .await
        .unwrap();
    let second = resolver::resolve_trip_offers(&gateway, "atrip-65262230")
        .await
        .unwrap();

    assert_eq!(first.offers, second.offers);

    // Even with both passes' offers thrown into one aggregation, the
    // dedup key keeps the counters at the true count.
    let mut combined = first.offers.clone();
    combined.extend(second.offers.clone());
    let aggregated = aggregator::aggregate(combined, first.total_quotes);
    assert_eq!(aggregated.offers.len(), 2);
    assert_eq!(aggregated.quotes_received, 2);

    // And the workflow join is idempotent across the repeated polls.
    let signals = workflow::WorkflowSignals {
        trip_exists: true,
        rfq_count: 3,
        quotes_received: 2,
        deep_link_present: true,
        ..Default::default()
    };
    let once = workflow::observe("atrip-65262230", WorkflowStep::Created, &signals);
    let twice = workflow::observe("atrip-65262230", once, &signals);
    assert_eq!(once, twice);
}

#[tokio::test]
async fn total_outage_surfaces_while_partial_outage_degrades() {
    // Trip fetch failing on both identifier forms is fatal.
    let gateway = MockGateway::new()
        .fail_trip("atrip-1", MockFailure::Unavailable)
        .fail_trip("1", MockFailure::Unavailable);
    let err = resolver::resolve_trip_offers(&gateway, "atrip-1")
        .await
        .unwrap_err();
    assert!(!err.is_not_found());

    // One dead quote endpoint only costs that operator's offer.
    let gateway = MockGateway::new()
        .with_trip("atrip-65262230", mixed_trip())
        .fail_quote("aquote-390825418", MockFailure::Unavailable)
        .fail_quote("390825418", MockFailure::Unavailable);

    let resolution = resolver::resolve_trip_offers(&gateway, "atrip-65262230")
        .await
        .unwrap();
    assert_eq!(resolution.offers.len(), 1);
    assert_eq!(resolution.offers[0].operator, "Acme Jets");
    assert_eq!(resolution.warnings.len(), 1);
}
