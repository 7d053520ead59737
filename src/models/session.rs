use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::trip::RouteSnapshot;

/// Position in the fixed booking workflow. One enum is the source of
/// truth; the legacy `status`/`session_status` columns are derived views
/// written alongside it, never mutated on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Created,
    Searching,
    TripCreated,
    AwaitingSelection,
    QuotesUpdating,
    SelectionMade,
    ContractGenerated,
    ProposalSent,
    Completed,
    Failed,
}

impl WorkflowStep {
    /// Ordering column persisted next to the step name; the SQL upsert
    /// takes GREATEST over it so concurrent pollers can never regress a
    /// session. `Failed` ranks above everything: it absorbs until an
    /// explicit reset.
    pub fn rank(self) -> i16 {
        match self {
            WorkflowStep::Created => 0,
            WorkflowStep::Searching => 1,
            WorkflowStep::TripCreated => 2,
            WorkflowStep::AwaitingSelection => 3,
            WorkflowStep::QuotesUpdating => 4,
            WorkflowStep::SelectionMade => 5,
            WorkflowStep::ContractGenerated => 6,
            WorkflowStep::ProposalSent => 7,
            WorkflowStep::Completed => 8,
            WorkflowStep::Failed => 99,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Created => "created",
            WorkflowStep::Searching => "searching",
            WorkflowStep::TripCreated => "trip_created",
            WorkflowStep::AwaitingSelection => "awaiting_selection",
            WorkflowStep::QuotesUpdating => "quotes_updating",
            WorkflowStep::SelectionMade => "selection_made",
            WorkflowStep::ContractGenerated => "contract_generated",
            WorkflowStep::ProposalSent => "proposal_sent",
            WorkflowStep::Completed => "completed",
            WorkflowStep::Failed => "failed",
        }
    }

    /// Rows written before this revision may carry unknown step names;
    /// they re-derive from objective signals on the next poll anyway.
    pub fn parse(raw: &str) -> WorkflowStep {
        match raw {
            "created" => WorkflowStep::Created,
            "searching" => WorkflowStep::Searching,
            "trip_created" => WorkflowStep::TripCreated,
            "awaiting_selection" => WorkflowStep::AwaitingSelection,
            "quotes_updating" => WorkflowStep::QuotesUpdating,
            "selection_made" => WorkflowStep::SelectionMade,
            "contract_generated" => WorkflowStep::ContractGenerated,
            "proposal_sent" => WorkflowStep::ProposalSent,
            "completed" => WorkflowStep::Completed,
            "failed" => WorkflowStep::Failed,
            _ => WorkflowStep::Created,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStep::Completed | WorkflowStep::Failed)
    }

    /// Monotonic join: the observation objectively further along wins,
    /// and `Failed` absorbs every later observation.
    pub fn join(self, other: WorkflowStep) -> WorkflowStep {
        if self == WorkflowStep::Failed || other == WorkflowStep::Failed {
            return WorkflowStep::Failed;
        }
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// Legacy coarse `status` column.
    pub fn lifecycle_status(self) -> &'static str {
        match self {
            WorkflowStep::Created | WorkflowStep::Searching | WorkflowStep::TripCreated => "sourcing",
            WorkflowStep::AwaitingSelection | WorkflowStep::QuotesUpdating => "quoting",
            WorkflowStep::SelectionMade
            | WorkflowStep::ContractGenerated
            | WorkflowStep::ProposalSent => "booking",
            WorkflowStep::Completed => "completed",
            WorkflowStep::Failed => "failed",
        }
    }

    /// Legacy `session_status` column from the earlier schema revision.
    pub fn legacy_session_status(self) -> &'static str {
        match self {
            WorkflowStep::Completed => "closed",
            WorkflowStep::Failed => "error",
            _ => "active",
        }
    }
}

/// One persisted row per trip, owned by the application.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TripSession {
    pub trip_id: String,
    pub status: String,
    pub session_status: String,
    pub current_step: String,
    #[serde(skip)]
    pub step_rank: i16,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_date: Option<String>,
    pub passenger_count: Option<i32>,
    pub quotes_received: i32,
    pub quotes_expected: i32,
    pub deep_link: Option<String>,
    pub workflow_state: Value,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl TripSession {
    pub fn step(&self) -> WorkflowStep {
        WorkflowStep::parse(&self.current_step)
    }

    pub fn selection_recorded(&self) -> bool {
        self.workflow_state.get("selection").is_some()
    }

    pub fn milestone_recorded(&self, step: WorkflowStep) -> bool {
        self.workflow_state
            .pointer(&format!("/milestones/{}", step.as_str()))
            .is_some()
    }
}

/// What one completed resolution pass writes back to the session row.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub trip_id: String,
    pub step: WorkflowStep,
    pub route: RouteSnapshot,
    pub quotes_received: i32,
    pub quotes_expected: i32,
    pub deep_link: Option<String>,
    pub workflow_state: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_never_regresses() {
        let join = WorkflowStep::QuotesUpdating.join(WorkflowStep::TripCreated);
        assert_eq!(join, WorkflowStep::QuotesUpdating);
        let join = WorkflowStep::TripCreated.join(WorkflowStep::QuotesUpdating);
        assert_eq!(join, WorkflowStep::QuotesUpdating);
    }

    #[test]
    fn failed_absorbs_everything() {
        assert_eq!(
            WorkflowStep::Failed.join(WorkflowStep::Completed),
            WorkflowStep::Failed
        );
        assert_eq!(
            WorkflowStep::AwaitingSelection.join(WorkflowStep::Failed),
            WorkflowStep::Failed
        );
    }

    #[test]
    fn step_names_round_trip() {
        for step in [
            WorkflowStep::Created,
            WorkflowStep::Searching,
            WorkflowStep::TripCreated,
            WorkflowStep::AwaitingSelection,
            WorkflowStep::QuotesUpdating,
            WorkflowStep::SelectionMade,
            WorkflowStep::ContractGenerated,
            WorkflowStep::ProposalSent,
            WorkflowStep::Completed,
            WorkflowStep::Failed,
        ] {
            assert_eq!(WorkflowStep::parse(step.as_str()), step);
        }
    }

    #[test]
    fn legacy_columns_derive_from_the_step() {
        assert_eq!(WorkflowStep::QuotesUpdating.lifecycle_status(), "quoting");
        assert_eq!(WorkflowStep::QuotesUpdating.legacy_session_status(), "active");
        assert_eq!(WorkflowStep::Completed.legacy_session_status(), "closed");
        assert_eq!(WorkflowStep::Failed.lifecycle_status(), "failed");
    }
}
