//! Walks a trip's RFQ/lift/quote graph and resolves every priced lift
//! into a [`FlightOffer`].
//!
//! Operator responsiveness decides how much of the graph is inlined:
//! pricing may sit on the lift itself, behind a quote reference
//! requiring a second fetch, or be absent entirely; the RFQ itself may
//! arrive as a bare reference that needs its own fetch. One unreachable
//! resource must never blank out the other operators' offers: per-RFQ
//! and per-lift failures are collected as warnings and the pass
//! continues. Only an authentication failure, or a trip that cannot be
//! fetched under either identifier form, aborts the call.

use futures::future::join_all;
use serde_json::Value;
use tracing::warn;

use crate::error::GatewayError;
use crate::gateway::ids::{self, QUOTE_PREFIX, RFQ_PREFIX, TRIP_PREFIX};
use crate::gateway::MarketplaceApi;
use crate::models::offer::FlightOffer;
use crate::models::trip;
use crate::services::pricing::{self, NormalizedPrice};

#[derive(Debug)]
pub struct TripResolution {
    /// Identifier form the marketplace itself reports for the trip.
    pub trip_id: String,
    /// Raw trip payload; the deep-link extractor and the session
    /// snapshot read from it without another round trip.
    pub trip: Value,
    pub offers: Vec<FlightOffer>,
    /// One invited operator per RFQ, answered or not.
    pub total_quotes: usize,
    /// Per-RFQ and per-lift failures recovered during the pass.
    pub warnings: Vec<String>,
}

enum LiftOutcome {
    Offer(FlightOffer),
    Missing(String),
}

pub async fn resolve_trip_offers(
    gateway: &dyn MarketplaceApi,
    trip_id: &str,
) -> Result<TripResolution, GatewayError> {
    let trip = fetch_trip(gateway, trip_id).await?;
    let canonical_id = trip::canonical_trip_id(&trip, trip_id);

    let total_quotes = trip::rfqs(&trip).len();
    let mut warnings = Vec::new();

    // Stage 1: hydrate RFQ entries that arrived as bare references.
    // join_all keeps trip order.
    let hydration = join_all(
        trip::rfqs(&trip)
            .iter()
            .map(|rfq| hydrate_rfq(gateway, rfq)),
    )
    .await;

    let mut rfqs = Vec::with_capacity(total_quotes);
    for outcome in hydration {
        let (rfq, warning) = outcome?;
        if let Some(reason) = warning {
            warn!(target: "resolver", "⚠️ trip {}: {}", canonical_id, reason);
            warnings.push(reason);
        }
        rfqs.push(rfq);
    }

    // Stage 2: one branch per lift. join_all slots results back in
    // source order (RFQ order on the trip, lift order within the RFQ)
    // no matter which concurrent fetch completes first.
    let mut branches = Vec::new();
    for (rfq_index, rfq) in rfqs.iter().enumerate() {
        let rfq_id = trip::rfq_id(rfq)
            .map(str::to_string)
            .unwrap_or_else(|| format!("rfq-{}", rfq_index));
        let status = trip::rfq_status(rfq);
        for (lift_index, lift) in trip::lifts(rfq).iter().enumerate() {
            branches.push(resolve_lift(
                gateway,
                &trip,
                rfq,
                lift,
                rfq_id.clone(),
                status.clone(),
                lift_index,
            ));
        }
    }
    let outcomes = join_all(branches).await;

    let mut offers = Vec::new();
    for outcome in outcomes {
        match outcome? {
            LiftOutcome::Offer(offer) => offers.push(offer),
            LiftOutcome::Missing(reason) => {
                warn!(target: "resolver", "⚠️ trip {}: {}", canonical_id, reason);
                warnings.push(reason);
            }
        }
    }

    Ok(TripResolution {
        trip_id: canonical_id,
        trip,
        offers,
        total_quotes,
        warnings,
    })
}

/// The upstream is inconsistent about which identifier form an endpoint
/// expects; a 404 on the stored form gets one retry with the alternate
/// (raw ↔ prefixed) before the failure is surfaced.
async fn fetch_trip(gateway: &dyn MarketplaceApi, trip_id: &str) -> Result<Value, GatewayError> {
    match gateway.get_trip(trip_id).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_not_found() => {
            let Some(alternate) = ids::alternate_form(trip_id, TRIP_PREFIX) else {
                return Err(e);
            };
            let found = gateway.get_trip(&alternate).await?;
            warn!(
                target: "gateway",
                "⚠️ identifier form mismatch: trip {} only resolved as {}",
                trip_id, alternate
            );
            Ok(found)
        }
        Err(e) => Err(e),
    }
}

/// An RFQ entry without a `lifts` section is a bare reference; the full
/// record lives behind `GET /rfqs/{id}`. A failed hydration costs that
/// operator's offers only.
async fn hydrate_rfq(
    gateway: &dyn MarketplaceApi,
    rfq: &Value,
) -> Result<(Value, Option<String>), GatewayError> {
    if rfq.get("lifts").is_some() {
        return Ok((rfq.clone(), None));
    }
    let Some(rfq_id) = trip::rfq_id(rfq) else {
        return Ok((rfq.clone(), None));
    };

    match fetch_rfq(gateway, rfq_id).await {
        Ok(full) => Ok((full, None)),
        // Auth failures are fatal for the whole call, never recovered.
        Err(e) if e.is_auth() => Err(e),
        Err(e) => Ok((rfq.clone(), Some(format!("rfq {}: {}", rfq_id, e)))),
    }
}

async fn fetch_rfq(gateway: &dyn MarketplaceApi, rfq_id: &str) -> Result<Value, GatewayError> {
    match gateway.get_rfq(rfq_id).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_not_found() => {
            let Some(alternate) = ids::alternate_form(rfq_id, RFQ_PREFIX) else {
                return Err(e);
            };
            let found = gateway.get_rfq(&alternate).await?;
            warn!(
                target: "gateway",
                "⚠️ identifier form mismatch: rfq {} only resolved as {}",
                rfq_id, alternate
            );
            Ok(found)
        }
        Err(e) => Err(e),
    }
}

/// Quote references go prefixed-first (the authoritative form), bare
/// numeric on 404.
async fn fetch_quote(gateway: &dyn MarketplaceApi, quote_ref: &str) -> Result<Value, GatewayError> {
    let prefixed = ids::with_prefix(quote_ref, QUOTE_PREFIX);
    match gateway.get_quote(&prefixed).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_not_found() => {
            let bare = ids::strip_known_prefix(quote_ref);
            let found = gateway.get_quote(bare).await?;
            warn!(
                target: "gateway",
                "⚠️ identifier form mismatch: quote {} only resolved as {}",
                prefixed, bare
            );
            Ok(found)
        }
        Err(e) => Err(e),
    }
}

async fn resolve_lift(
    gateway: &dyn MarketplaceApi,
    trip: &Value,
    rfq: &Value,
    lift: &Value,
    rfq_id: String,
    status: String,
    lift_index: usize,
) -> Result<LiftOutcome, GatewayError> {
    let quote_ref = trip::quote_reference(lift);

    // Inline pricing needs no secondary fetch.
    if let Some(price) = pricing::normalize_price(lift) {
        return Ok(LiftOutcome::Offer(build_offer(
            trip, rfq, lift, None, rfq_id, status, lift_index, price, quote_ref,
        )));
    }

    let Some(quote_ref) = quote_ref else {
        return Ok(LiftOutcome::Missing(format!(
            "rfq {} lift {} has neither inline pricing nor a quote reference",
            rfq_id, lift_index
        )));
    };

    match fetch_quote(gateway, &quote_ref).await {
        Ok(quote) => match pricing::normalize_price(&quote) {
            Some(price) => Ok(LiftOutcome::Offer(build_offer(
                trip,
                rfq,
                lift,
                Some(&quote),
                rfq_id,
                status,
                lift_index,
                price,
                Some(quote_ref),
            ))),
            None => Ok(LiftOutcome::Missing(format!(
                "quote {} carries no parseable price",
                quote_ref
            ))),
        },
        Err(e) if e.is_auth() => Err(e),
        Err(e) => Ok(LiftOutcome::Missing(format!(
            "rfq {} lift {}: {}",
            rfq_id, lift_index, e
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_offer(
    trip: &Value,
    rfq: &Value,
    lift: &Value,
    quote: Option<&Value>,
    rfq_id: String,
    status: String,
    lift_index: usize,
    price: NormalizedPrice,
    quote_ref: Option<String>,
) -> FlightOffer {
    // Bare-normalized so the same quote dedups across identifier forms.
    let quote_id = quote
        .and_then(|q| q.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .or(quote_ref)
        .map(|id| ids::strip_known_prefix(&id).to_string());

    FlightOffer {
        rfq_id,
        quote_id,
        lift_index,
        operator: trip::seller_name(rfq).unwrap_or("Unknown operator").to_string(),
        aircraft_type: trip::aircraft_field(lift, quote, "aircraftType")
            .unwrap_or("")
            .to_string(),
        aircraft_category: trip::aircraft_field(lift, quote, "aircraftCategory")
            .unwrap_or("")
            .to_string(),
        aircraft_tail: trip::aircraft_field(lift, quote, "aircraftTail").map(str::to_string),
        total_price: price.amount,
        currency: price.currency,
        response_latency_minutes: trip::response_latency_minutes(trip, rfq),
        status,
    }
}
