//! Orchestrates one poll of a trip: resolve, aggregate, extract the deep
//! link, recompute the workflow step, and commit the session row.
//!
//! No session state is written while upstream fetches are still in
//! flight; a caller that abandons the future mid-pass leaves the stored
//! session exactly as it was.

use serde_json::json;
use tracing::{event, Level};

use crate::db::trip_session as sessions;
use crate::error::EngineError;
use crate::gateway::ids::{self, TRIP_PREFIX};
use crate::models::offer::FlightOffer;
use crate::models::session::{SessionSnapshot, TripSession, WorkflowStep};
use crate::models::trip;
use crate::services::{aggregator, deep_link, resolver, workflow};
use crate::state::AppState;

pub struct PollOutcome {
    pub offers: Vec<FlightOffer>,
    pub total_quotes: usize,
    pub warnings: Vec<String>,
    pub session: TripSession,
}

pub async fn poll_trip(state: &AppState, trip_id: &str) -> Result<PollOutcome, EngineError> {
    let started = std::time::Instant::now();

    let resolution = resolver::resolve_trip_offers(state.gateway.as_ref(), trip_id).await?;
    let aggregated = aggregator::aggregate(resolution.offers, resolution.total_quotes);
    let link = deep_link::extract(&resolution.trip);

    let stored = find_session(state, &resolution.trip_id, trip_id).await?;
    let stored_step = stored
        .as_ref()
        .map(TripSession::step)
        .unwrap_or(WorkflowStep::Created);

    let signals = workflow::WorkflowSignals {
        trip_exists: true,
        rfq_count: aggregated.quotes_expected,
        quotes_received: aggregated.quotes_received,
        deep_link_present: link.is_some()
            || stored.as_ref().is_some_and(|s| s.deep_link.is_some()),
        selection_recorded: stored.as_ref().is_some_and(TripSession::selection_recorded),
        contract_recorded: stored
            .as_ref()
            .is_some_and(|s| s.milestone_recorded(WorkflowStep::ContractGenerated)),
        proposal_recorded: stored
            .as_ref()
            .is_some_and(|s| s.milestone_recorded(WorkflowStep::ProposalSent)),
        completion_recorded: stored
            .as_ref()
            .is_some_and(|s| s.milestone_recorded(WorkflowStep::Completed)),
    };
    let step = workflow::observe(&resolution.trip_id, stored_step, &signals);

    let snapshot = SessionSnapshot {
        trip_id: resolution.trip_id.clone(),
        step,
        route: trip::route_snapshot(&resolution.trip),
        quotes_received: aggregated.quotes_received as i32,
        quotes_expected: aggregated.quotes_expected as i32,
        deep_link: link,
        workflow_state: json!({
            "lastPoll": {
                "offers": aggregated.offers.len(),
                "warnings": resolution.warnings,
                "durationMs": started.elapsed().as_millis() as u64,
            }
        }),
    };
    let session = sessions::upsert_observation(&state.db_pool, &snapshot).await?;

    event!(
        target: "perf",
        Level::INFO,
        trip_id = %session.trip_id,
        offers = aggregated.offers.len(),
        quotes_expected = aggregated.quotes_expected,
        duration_ms = %started.elapsed().as_millis(),
        "resolution pass"
    );

    Ok(PollOutcome {
        offers: aggregated.offers,
        total_quotes: aggregated.quotes_expected,
        warnings: resolution.warnings,
        session,
    })
}

/// Read-only session view; tolerates either identifier form.
pub async fn workflow_state(state: &AppState, trip_id: &str) -> Result<TripSession, EngineError> {
    find_session(state, trip_id, trip_id)
        .await?
        .ok_or_else(|| EngineError::UnknownTrip(trip_id.to_string()))
}

/// Records the customer's chosen quote. The matching offer is stored
/// verbatim in the session's workflow state: contract and proposal
/// generation read their pricing input from there.
pub async fn record_selection(
    state: &AppState,
    trip_id: &str,
    quote_id: &str,
) -> Result<TripSession, EngineError> {
    let outcome = poll_trip(state, trip_id).await?;

    let bare = ids::strip_known_prefix(quote_id);
    let offer = outcome
        .offers
        .iter()
        .find(|o| o.quote_id.as_deref() == Some(bare))
        .ok_or_else(|| EngineError::UnknownQuote(quote_id.to_string()))?;

    let offer_json =
        serde_json::to_value(offer).map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
    sessions::record_selection(&state.db_pool, &outcome.session.trip_id, &offer_json)
        .await?
        .ok_or_else(|| EngineError::UnknownTrip(trip_id.to_string()))
}

/// Collaborators (contract generation, proposal delivery) report
/// milestones here; the tracker joins the corresponding step.
pub async fn record_milestone(
    state: &AppState,
    trip_id: &str,
    milestone: WorkflowStep,
) -> Result<TripSession, EngineError> {
    let session = workflow_state(state, trip_id).await?;

    match milestone {
        WorkflowStep::ContractGenerated | WorkflowStep::ProposalSent => {
            if session.step().rank() < WorkflowStep::SelectionMade.rank() {
                return Err(EngineError::InvalidRequest(format!(
                    "cannot record {} before a selection is made",
                    milestone.as_str()
                )));
            }
        }
        WorkflowStep::Completed => {
            if session.step().rank() < WorkflowStep::AwaitingSelection.rank() {
                return Err(EngineError::InvalidRequest(
                    "cannot complete a trip that never reached awaiting_selection".to_string(),
                ));
            }
        }
        WorkflowStep::Failed => {
            if session.step().is_terminal() {
                return Err(EngineError::InvalidRequest(
                    "trip is already in a terminal state".to_string(),
                ));
            }
        }
        other => {
            return Err(EngineError::InvalidRequest(format!(
                "{} is not a reportable milestone",
                other.as_str()
            )));
        }
    }

    sessions::record_milestone(&state.db_pool, &session.trip_id, milestone)
        .await?
        .ok_or_else(|| EngineError::UnknownTrip(trip_id.to_string()))
}

/// Administrative reset: the only transition allowed to move backward.
pub async fn reset(state: &AppState, trip_id: &str) -> Result<TripSession, EngineError> {
    let session = workflow_state(state, trip_id).await?;
    sessions::reset_session(&state.db_pool, &session.trip_id)
        .await?
        .ok_or_else(|| EngineError::UnknownTrip(trip_id.to_string()))
}

/// Sessions may have been keyed under either identifier form by earlier
/// revisions; look under every form before concluding the trip is new.
async fn find_session(
    state: &AppState,
    canonical: &str,
    requested: &str,
) -> Result<Option<TripSession>, EngineError> {
    let mut candidates = vec![canonical.to_string()];
    for id in [canonical, requested] {
        if !candidates.contains(&id.to_string()) {
            candidates.push(id.to_string());
        }
        if let Some(alternate) = ids::alternate_form(id, TRIP_PREFIX) {
            if !candidates.contains(&alternate) {
                candidates.push(alternate);
            }
        }
    }

    for candidate in candidates {
        if let Some(session) = sessions::get_session(&state.db_pool, &candidate).await? {
            return Ok(Some(session));
        }
    }
    Ok(None)
}
