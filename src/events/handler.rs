use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::info;

use crate::events::utils::extract_trip_id;
use crate::models::events::{AppEvent, EventType};
use crate::services::session;
use crate::state::AppState;

/// A marketplace event means the trip's quote graph changed; refresh it.
/// Throttled per trip so a burst of operator responses turns into one
/// resolution pass, not one per webhook.
pub async fn handle_event(state: &AppState, event: AppEvent) -> Result<()> {
    let trip_id = extract_trip_id(&event)?;

    match event.event_type {
        EventType::QuoteReceived | EventType::TripUpdated => {
            if recently_polled(state, &trip_id) {
                info!(
                    "⏳ Skipping refresh for trip {} (polled within the last {}s)",
                    trip_id, state.config.webhook.throttle_secs
                );
                return Ok(());
            }

            let outcome = session::poll_trip(state, &trip_id).await?;
            info!(
                "✅ Refreshed trip {} → {} offers ({}/{} quotes), step {}",
                outcome.session.trip_id,
                outcome.offers.len(),
                outcome.session.quotes_received,
                outcome.session.quotes_expected,
                outcome.session.current_step
            );
        }
    }

    Ok(())
}

fn recently_polled(state: &AppState, trip_id: &str) -> bool {
    let throttle = Duration::from_secs(state.config.webhook.throttle_secs);
    let now = Instant::now();
    let mut skip = false;

    state
        .shared_state
        .recent_polls
        .entry(trip_id.to_string())
        .and_modify(|last| {
            if now.duration_since(*last) < throttle {
                skip = true;
            } else {
                *last = now;
            }
        })
        .or_insert(now);

    skip
}
