//! Trip session persistence.
//!
//! Every write is a partial-field update scoped to what the engine owns;
//! unrelated columns on the row are never rewritten. The step join
//! happens inside the statement (GREATEST over `step_rank`), so two
//! concurrent pollers converge instead of racing last-writer-wins.

use serde_json::Value;
use sqlx::{query_as, PgPool};

use crate::models::session::{SessionSnapshot, TripSession, WorkflowStep};

pub async fn get_session(pool: &PgPool, trip_id: &str) -> Result<Option<TripSession>, sqlx::Error> {
    query_as::<_, TripSession>("SELECT * FROM trip_sessions WHERE trip_id = $1")
        .bind(trip_id)
        .fetch_optional(pool)
        .await
}

/// Commit of one completed resolution pass.
///
/// Step columns only move forward; route snapshot fields are immutable
/// once captured; counters reflect the observed pass (a complete pass is
/// the true count, so no GREATEST there); workflow_state merges so
/// selection/milestone records written by other callers survive.
pub async fn upsert_observation(
    pool: &PgPool,
    snap: &SessionSnapshot,
) -> Result<TripSession, sqlx::Error> {
    query_as::<_, TripSession>(
        r#"
        INSERT INTO trip_sessions (
            trip_id, status, session_status, current_step, step_rank,
            departure_airport, arrival_airport, departure_date, passenger_count,
            quotes_received, quotes_expected, deep_link, workflow_state,
            created_at, last_activity_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now(), now())
        ON CONFLICT (trip_id) DO UPDATE
        SET
            step_rank = GREATEST(trip_sessions.step_rank, EXCLUDED.step_rank),
            current_step = CASE
                WHEN EXCLUDED.step_rank >= trip_sessions.step_rank
                THEN EXCLUDED.current_step
                ELSE trip_sessions.current_step
            END,
            status = CASE
                WHEN EXCLUDED.step_rank >= trip_sessions.step_rank
                THEN EXCLUDED.status
                ELSE trip_sessions.status
            END,
            session_status = CASE
                WHEN EXCLUDED.step_rank >= trip_sessions.step_rank
                THEN EXCLUDED.session_status
                ELSE trip_sessions.session_status
            END,
            departure_airport = COALESCE(trip_sessions.departure_airport, EXCLUDED.departure_airport),
            arrival_airport = COALESCE(trip_sessions.arrival_airport, EXCLUDED.arrival_airport),
            departure_date = COALESCE(trip_sessions.departure_date, EXCLUDED.departure_date),
            passenger_count = COALESCE(trip_sessions.passenger_count, EXCLUDED.passenger_count),
            quotes_received = EXCLUDED.quotes_received,
            quotes_expected = EXCLUDED.quotes_expected,
            deep_link = COALESCE(EXCLUDED.deep_link, trip_sessions.deep_link),
            workflow_state = trip_sessions.workflow_state || EXCLUDED.workflow_state,
            last_activity_at = now()
        RETURNING *
        "#,
    )
    .bind(&snap.trip_id)
    .bind(snap.step.lifecycle_status())
    .bind(snap.step.legacy_session_status())
    .bind(snap.step.as_str())
    .bind(snap.step.rank())
    .bind(&snap.route.departure_airport)
    .bind(&snap.route.arrival_airport)
    .bind(&snap.route.departure_date)
    .bind(snap.route.passenger_count)
    .bind(snap.quotes_received)
    .bind(snap.quotes_expected)
    .bind(&snap.deep_link)
    .bind(&snap.workflow_state)
    .fetch_one(pool)
    .await
}

pub async fn record_selection(
    pool: &PgPool,
    trip_id: &str,
    offer: &Value,
) -> Result<Option<TripSession>, sqlx::Error> {
    let step = WorkflowStep::SelectionMade;
    query_as::<_, TripSession>(
        r#"
        UPDATE trip_sessions
        SET
            workflow_state = workflow_state || jsonb_build_object('selection', $2::jsonb),
            step_rank = GREATEST(step_rank, $3),
            current_step = CASE WHEN $3 >= step_rank THEN $4 ELSE current_step END,
            status = CASE WHEN $3 >= step_rank THEN $5 ELSE status END,
            session_status = CASE WHEN $3 >= step_rank THEN $6 ELSE session_status END,
            last_activity_at = now()
        WHERE trip_id = $1
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(offer)
    .bind(step.rank())
    .bind(step.as_str())
    .bind(step.lifecycle_status())
    .bind(step.legacy_session_status())
    .fetch_optional(pool)
    .await
}

pub async fn record_milestone(
    pool: &PgPool,
    trip_id: &str,
    milestone: WorkflowStep,
) -> Result<Option<TripSession>, sqlx::Error> {
    query_as::<_, TripSession>(
        r#"
        UPDATE trip_sessions
        SET
            workflow_state = workflow_state || jsonb_build_object(
                'milestones',
                COALESCE(workflow_state->'milestones', '{}'::jsonb)
                    || jsonb_build_object($2::text, now()::text)
            ),
            step_rank = GREATEST(step_rank, $3),
            current_step = CASE WHEN $3 >= step_rank THEN $2 ELSE current_step END,
            status = CASE WHEN $3 >= step_rank THEN $4 ELSE status END,
            session_status = CASE WHEN $3 >= step_rank THEN $5 ELSE session_status END,
            last_activity_at = now()
        WHERE trip_id = $1
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(milestone.as_str())
    .bind(milestone.rank())
    .bind(milestone.lifecycle_status())
    .bind(milestone.legacy_session_status())
    .fetch_optional(pool)
    .await
}

/// The only backward transition. Counters, route snapshot and the deep
/// link survive; only the step goes back to the start.
pub async fn reset_session(
    pool: &PgPool,
    trip_id: &str,
) -> Result<Option<TripSession>, sqlx::Error> {
    let step = WorkflowStep::Created;
    query_as::<_, TripSession>(
        r#"
        UPDATE trip_sessions
        SET
            current_step = $2,
            step_rank = $3,
            status = $4,
            session_status = $5,
            workflow_state = workflow_state
                || jsonb_build_object('reset', jsonb_build_object('at', now()::text)),
            last_activity_at = now()
        WHERE trip_id = $1
        RETURNING *
        "#,
    )
    .bind(trip_id)
    .bind(step.as_str())
    .bind(step.rank())
    .bind(step.lifecycle_status())
    .bind(step.legacy_session_status())
    .fetch_optional(pool)
    .await
}

/// Sessions still waiting on operator responses, for the scheduled
/// refresh. Bounded and oldest-activity-first so a busy book of trips
/// drains fairly.
pub async fn list_refreshable_sessions(
    pool: &PgPool,
    active_window_secs: f64,
    limit: i64,
) -> Result<Vec<TripSession>, sqlx::Error> {
    query_as::<_, TripSession>(
        r#"
        SELECT * FROM trip_sessions
        WHERE step_rank BETWEEN $1 AND $2
          AND last_activity_at > now() - make_interval(secs => $3)
        ORDER BY last_activity_at ASC
        LIMIT $4
        "#,
    )
    .bind(WorkflowStep::TripCreated.rank())
    .bind(WorkflowStep::QuotesUpdating.rank())
    .bind(active_window_secs)
    .bind(limit)
    .fetch_all(pool)
    .await
}
