//! Defensive views over raw marketplace payloads.
//!
//! The upstream schema has drifted over the years: identifiers appear
//! under different keys, sellers are nested differently per endpoint, and
//! whole sections go missing when an operator has not responded. Every
//! accessor here tolerates absence and returns an `Option` or an empty
//! slice instead of guessing.

use chrono::DateTime;
use serde_json::Value;

const EMPTY: &[Value] = &[];

/// The trip id as the marketplace itself names it, falling back to the
/// identifier the caller used when the payload omits one.
pub fn canonical_trip_id(trip: &Value, fallback: &str) -> String {
    trip.get("id")
        .and_then(Value::as_str)
        .or_else(|| trip.get("tripId").and_then(Value::as_str))
        .unwrap_or(fallback)
        .to_string()
}

pub fn rfqs(trip: &Value) -> &[Value] {
    trip.get("rfqs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(EMPTY)
}

pub fn rfq_id(rfq: &Value) -> Option<&str> {
    rfq.get("id")
        .and_then(Value::as_str)
        .or_else(|| rfq.get("rfqId").and_then(Value::as_str))
}

pub fn seller_name(rfq: &Value) -> Option<&str> {
    rfq.pointer("/sellerCompany/name")
        .or_else(|| rfq.pointer("/seller/name"))
        .or_else(|| rfq.get("operator"))
        .and_then(Value::as_str)
}

/// Display status of an RFQ; operators that have not answered yet simply
/// have no status upstream.
pub fn rfq_status(rfq: &Value) -> String {
    rfq.get("displayStatus")
        .or_else(|| rfq.get("status"))
        .and_then(Value::as_str)
        .unwrap_or("unanswered")
        .to_lowercase()
}

pub fn lifts(rfq: &Value) -> &[Value] {
    rfq.get("lifts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(EMPTY)
}

/// Identifier of the quote a lift points at when pricing is not inline.
/// Seen as a plain `quoteId`, a nested `quote.id`, or only as the tail of
/// a `quote.href` link.
pub fn quote_reference(lift: &Value) -> Option<String> {
    if let Some(id) = lift.get("quoteId").and_then(Value::as_str) {
        return Some(id.to_string());
    }
    if let Some(id) = lift.pointer("/quote/id").and_then(Value::as_str) {
        return Some(id.to_string());
    }
    lift.pointer("/quote/href")
        .and_then(Value::as_str)
        .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
        .map(|s| s.split('?').next().unwrap_or(s).to_string())
}

/// Aircraft detail for an offer: the lift record wins, the fetched quote
/// (which nests a `lift` of its own) fills the gaps.
pub fn aircraft_field<'a>(lift: &'a Value, quote: Option<&'a Value>, key: &str) -> Option<&'a str> {
    lift.get(key)
        .or_else(|| lift.pointer(&format!("/aircraft/{}", key)))
        .or_else(|| quote.and_then(|q| q.pointer(&format!("/lift/{}", key))))
        .or_else(|| quote.and_then(|q| q.get(key)))
        .and_then(Value::as_str)
}

/// Minutes between the trip broadcast and the operator's response, when
/// both timestamps are present and parseable.
pub fn response_latency_minutes(trip: &Value, rfq: &Value) -> Option<i64> {
    let created = timestamp(trip, &["createdDate", "created", "createdAt"])?;
    let responded = timestamp(rfq, &["receivedDate", "respondedDate", "updatedDate", "updatedAt"])?;
    let minutes = (responded - created).num_minutes();
    (minutes >= 0).then_some(minutes)
}

fn timestamp(value: &Value, keys: &[&str]) -> Option<DateTime<chrono::FixedOffset>> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
}

/// Immutable route/date/passenger fields snapshotted onto the session.
#[derive(Debug, Clone, Default)]
pub struct RouteSnapshot {
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_date: Option<String>,
    pub passenger_count: Option<i32>,
}

pub fn route_snapshot(trip: &Value) -> RouteSnapshot {
    let segment = trip
        .get("segments")
        .and_then(Value::as_array)
        .and_then(|s| s.first());

    let Some(segment) = segment else {
        return RouteSnapshot::default();
    };

    RouteSnapshot {
        departure_airport: airport_code(segment, "startAirport"),
        arrival_airport: airport_code(segment, "endAirport"),
        departure_date: segment
            .pointer("/dateTime/date")
            .or_else(|| segment.get("date"))
            .and_then(Value::as_str)
            .map(str::to_string),
        passenger_count: passenger_count(segment),
    }
}

fn airport_code(segment: &Value, key: &str) -> Option<String> {
    let airport = segment.get(key)?;
    airport
        .get("icao")
        .or_else(|| airport.get("iata"))
        .and_then(Value::as_str)
        .or_else(|| airport.as_str())
        .map(str::to_string)
}

// paxCount arrives as "4" on some trips and 4 on others.
fn passenger_count(segment: &Value) -> Option<i32> {
    let raw = segment.get("paxCount")?;
    raw.as_i64()
        .map(|n| n as i32)
        .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_reference_from_each_shape() {
        assert_eq!(
            quote_reference(&json!({"quoteId": "aquote-1"})).as_deref(),
            Some("aquote-1")
        );
        assert_eq!(
            quote_reference(&json!({"quote": {"id": "aquote-2"}})).as_deref(),
            Some("aquote-2")
        );
        assert_eq!(
            quote_reference(&json!({"quote": {"href": "https://x/api/quotes/aquote-3?taildetails=true"}}))
                .as_deref(),
            Some("aquote-3")
        );
        assert_eq!(quote_reference(&json!({"aircraftType": "Citation"})), None);
    }

    #[test]
    fn route_snapshot_reads_string_and_numeric_pax() {
        let trip = json!({"segments": [{
            "startAirport": {"icao": "KTEB"},
            "endAirport": {"icao": "KMIA"},
            "dateTime": {"date": "2026-09-05"},
            "paxCount": "4"
        }]});
        let snap = route_snapshot(&trip);
        assert_eq!(snap.departure_airport.as_deref(), Some("KTEB"));
        assert_eq!(snap.arrival_airport.as_deref(), Some("KMIA"));
        assert_eq!(snap.departure_date.as_deref(), Some("2026-09-05"));
        assert_eq!(snap.passenger_count, Some(4));

        let numeric = json!({"segments": [{"paxCount": 6}]});
        assert_eq!(route_snapshot(&numeric).passenger_count, Some(6));
    }

    #[test]
    fn latency_requires_both_timestamps() {
        let trip = json!({"createdDate": "2026-08-01T10:00:00+00:00"});
        let rfq = json!({"receivedDate": "2026-08-01T11:30:00+00:00"});
        assert_eq!(response_latency_minutes(&trip, &rfq), Some(90));
        assert_eq!(response_latency_minutes(&trip, &json!({})), None);
    }
}
