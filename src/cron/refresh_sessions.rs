use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::db::trip_session;
use crate::services::session;
use crate::state::AppState;

/// Re-polls sessions still waiting on operator responses. Webhooks cover
/// the responsive operators; this sweep catches the ones that answer on
/// the marketplace without firing an event.
pub async fn run(state: AppState) {
    info!(target: "cron", "╔════════════════════════════════════════════╗");
    info!(target: "cron", "║   🔄 Starting session refresh cron.        ║");
    info!(target: "cron", "╚════════════════════════════════════════════╝");

    let sessions = match trip_session::list_refreshable_sessions(
        &state.db_pool,
        state.config.cron.active_window_secs as f64,
        state.config.cron.batch_limit,
    )
    .await
    {
        Ok(sessions) => sessions,
        Err(e) => {
            error!(target: "cron", "❌ Failed to list refreshable sessions: {:?}", e);
            return;
        }
    };

    if sessions.is_empty() {
        info!(target: "cron", "✅ No active sessions awaiting quotes.");
        return;
    }

    info!(target: "cron", "📦 Refreshing {} active session(s)...", sessions.len());

    for stored in sessions {
        match session::poll_trip(&state, &stored.trip_id).await {
            Ok(outcome) => {
                info!(
                    target: "cron",
                    "🔄 {} → {}/{} quotes, step {}",
                    outcome.session.trip_id,
                    outcome.session.quotes_received,
                    outcome.session.quotes_expected,
                    outcome.session.current_step
                );
            }
            Err(e) => {
                error!(target: "cron", "❌ Refresh failed for {}: {}", stored.trip_id, e);
            }
        }

        // Pace the upstream between trips.
        sleep(Duration::from_millis(500)).await;
    }

    info!(target: "cron", "✅ Finished session refresh cron.");
}
