use super::SelectionFilter;
use crate::domains::dispatching::{AssignmentCandidate, DispatchContext};
use crate::domains::fleet::VehicleControllerPool;
use std::sync::Arc;

/// Asks the vehicle's controller whether it can perform the order's operations.
pub struct CanProcess {
    controllers: Arc<dyn VehicleControllerPool>,
}

impl CanProcess {
    pub fn new(controllers: Arc<dyn VehicleControllerPool>) -> Self {
        Self { controllers }
    }
}

impl SelectionFilter<AssignmentCandidate> for CanProcess {
    fn name(&self) -> &'static str {
        "CanProcess"
    }

    fn apply(&self, candidate: &AssignmentCandidate, _ctx: &DispatchContext<'_>) -> Vec<String> {
        self.controllers
            .can_process(candidate.vehicle(), candidate.order())
    }
}

pub struct AcceptsOrderType;

impl SelectionFilter<AssignmentCandidate> for AcceptsOrderType {
    fn name(&self) -> &'static str {
        "AcceptsOrderType"
    }

    fn apply(&self, candidate: &AssignmentCandidate, _ctx: &DispatchContext<'_>) -> Vec<String> {
        let order_type = &candidate.order().order_type;
        if candidate.vehicle().accepts_order_type(order_type) {
            Vec::new()
        } else {
            vec![format!("order type {} not accepted", order_type)]
        }
    }
}

pub struct IntendedVehicleMatches;

impl SelectionFilter<AssignmentCandidate> for IntendedVehicleMatches {
    fn name(&self) -> &'static str {
        "IntendedVehicleMatches"
    }

    fn apply(&self, candidate: &AssignmentCandidate, _ctx: &DispatchContext<'_>) -> Vec<String> {
        match candidate.order().intended_vehicle.as_deref() {
            Some(intended) if intended != candidate.vehicle().name => {
                vec![format!("intended for {}", intended)]
            }
            _ => Vec::new(),
        }
    }
}

/// A sequence is processed by one vehicle, and that vehicle takes no orders from elsewhere.
pub struct SequenceVehicleMatches;

impl SelectionFilter<AssignmentCandidate> for SequenceVehicleMatches {
    fn name(&self) -> &'static str {
        "SequenceVehicleMatches"
    }

    fn apply(&self, candidate: &AssignmentCandidate, ctx: &DispatchContext<'_>) -> Vec<String> {
        let vehicle = candidate.vehicle();
        let order = candidate.order();
        let mut reasons = Vec::new();

        if let Some(bound) = vehicle.order_sequence.as_deref() {
            if order.wrapping_sequence.as_deref() != Some(bound) {
                reasons.push(format!("vehicle bound to sequence {}", bound));
            }
        }
        if let Some(sequence) = order
            .wrapping_sequence
            .as_deref()
            .and_then(|name| ctx.snapshot.sequences.get(name))
        {
            let owner = sequence
                .processing_vehicle
                .as_deref()
                .or(sequence.intended_vehicle.as_deref());
            if let Some(owner) = owner {
                if owner != vehicle.name {
                    reasons.push(format!("sequence {} belongs to {}", sequence.name, owner));
                }
            }
        }
        reasons
    }
}
