//! Workflow step recomputation.
//!
//! The tracker never trusts a cached step number on its own: every
//! observation recomputes the minimum admissible step from objective
//! signals and joins it with the stored value. Repeated polling is
//! idempotent, and two concurrent observers converge to the same step
//! regardless of interleaving.

use tracing::warn;

use crate::models::session::WorkflowStep;

/// Objective facts observed during one resolution pass, plus what the
/// stored session already records (selection, collaborator milestones).
#[derive(Debug, Clone, Default)]
pub struct WorkflowSignals {
    pub trip_exists: bool,
    pub rfq_count: usize,
    pub quotes_received: usize,
    pub deep_link_present: bool,
    pub selection_recorded: bool,
    pub contract_recorded: bool,
    pub proposal_recorded: bool,
    pub completion_recorded: bool,
}

/// The furthest step the signals prove the trip has reached.
pub fn minimum_admissible_step(signals: &WorkflowSignals) -> WorkflowStep {
    if signals.completion_recorded {
        return WorkflowStep::Completed;
    }
    if signals.proposal_recorded {
        return WorkflowStep::ProposalSent;
    }
    if signals.contract_recorded {
        return WorkflowStep::ContractGenerated;
    }
    if signals.selection_recorded {
        return WorkflowStep::SelectionMade;
    }
    if signals.quotes_received > 0 {
        return WorkflowStep::QuotesUpdating;
    }
    if signals.rfq_count > 0 || signals.deep_link_present {
        return WorkflowStep::AwaitingSelection;
    }
    if signals.trip_exists {
        return WorkflowStep::TripCreated;
    }
    WorkflowStep::Created
}

/// Monotonic join of the stored step with the recomputed minimum.
///
/// A contradiction between cached fields and objective signals is logged
/// and resolved in favor of the signals; it never fails the call.
pub fn observe(trip_id: &str, stored: WorkflowStep, signals: &WorkflowSignals) -> WorkflowStep {
    if signals.deep_link_present && signals.rfq_count == 0 {
        warn!(
            target: "workflow",
            "⚠️ consistency: trip {} has a deep link but no recorded RFQs; trusting the deep link",
            trip_id
        );
    }
    if signals.quotes_received > signals.rfq_count {
        warn!(
            target: "workflow",
            "⚠️ consistency: trip {} reports {} quotes over {} RFQs",
            trip_id, signals.quotes_received, signals.rfq_count
        );
    }

    stored.join(minimum_admissible_step(signals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoting_signals() -> WorkflowSignals {
        WorkflowSignals {
            trip_exists: true,
            rfq_count: 3,
            quotes_received: 2,
            deep_link_present: true,
            ..Default::default()
        }
    }

    #[test]
    fn minimum_step_climbs_with_the_signals() {
        let mut signals = WorkflowSignals::default();
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::Created);

        signals.trip_exists = true;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::TripCreated);

        signals.rfq_count = 2;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::AwaitingSelection);

        signals.quotes_received = 1;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::QuotesUpdating);

        signals.selection_recorded = true;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::SelectionMade);

        signals.contract_recorded = true;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::ContractGenerated);

        signals.proposal_recorded = true;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::ProposalSent);

        signals.completion_recorded = true;
        assert_eq!(minimum_admissible_step(&signals), WorkflowStep::Completed);
    }

    #[test]
    fn observe_never_regresses_a_stored_step() {
        let step = observe("atrip-1", WorkflowStep::SelectionMade, &quoting_signals());
        assert_eq!(step, WorkflowStep::SelectionMade);
    }

    #[test]
    fn observe_advances_a_stale_stored_step() {
        let step = observe("atrip-1", WorkflowStep::Created, &quoting_signals());
        assert_eq!(step, WorkflowStep::QuotesUpdating);
    }

    #[test]
    fn out_of_order_observations_converge() {
        // The final step must equal the max of the individually-computed
        // minimums, independent of observation order.
        let early = WorkflowSignals {
            trip_exists: true,
            ..Default::default()
        };
        let late = quoting_signals();

        let forward = observe("t", observe("t", WorkflowStep::Created, &early), &late);
        let backward = observe("t", observe("t", WorkflowStep::Created, &late), &early);
        assert_eq!(forward, backward);
        assert_eq!(forward, WorkflowStep::QuotesUpdating);
    }

    #[test]
    fn deep_link_with_zero_rfqs_still_advances() {
        // Objective signal wins over the inconsistent cached picture.
        let signals = WorkflowSignals {
            trip_exists: true,
            deep_link_present: true,
            ..Default::default()
        };
        let step = observe("atrip-1", WorkflowStep::Created, &signals);
        assert_eq!(step, WorkflowStep::AwaitingSelection);
    }

    #[test]
    fn failed_is_absorbing_under_observation() {
        let step = observe("atrip-1", WorkflowStep::Failed, &quoting_signals());
        assert_eq!(step, WorkflowStep::Failed);
    }
}
