use super::SelectionFilter;
use crate::domains::dispatching::DispatchContext;
use crate::domains::fleet::{IntegrationLevel, ProcState, Vehicle, VehicleState};

pub struct IsUtilizable;

impl SelectionFilter<Vehicle> for IsUtilizable {
    fn name(&self) -> &'static str {
        "IsUtilizable"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        if vehicle.integration_level == IntegrationLevel::ToBeUtilized {
            Vec::new()
        } else {
            vec![format!("integration level {:?}", vehicle.integration_level)]
        }
    }
}

pub struct IsNotPaused;

impl SelectionFilter<Vehicle> for IsNotPaused {
    fn name(&self) -> &'static str {
        "IsNotPaused"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        if vehicle.paused {
            vec!["vehicle paused".to_string()]
        } else {
            Vec::new()
        }
    }
}

pub struct HasKnownPosition;

impl SelectionFilter<Vehicle> for HasKnownPosition {
    fn name(&self) -> &'static str {
        "HasKnownPosition"
    }

    fn apply(&self, vehicle: &Vehicle, ctx: &DispatchContext<'_>) -> Vec<String> {
        match vehicle.current_position.as_deref() {
            None => vec!["position unknown".to_string()],
            Some(point) if !ctx.snapshot.model.is_point(point) => {
                vec![format!("position {} not in plant model", point)]
            }
            Some(_) => Vec::new(),
        }
    }
}

/// Vehicles that report errors or are unavailable do not take orders.
pub struct IsOperational;

impl SelectionFilter<Vehicle> for IsOperational {
    fn name(&self) -> &'static str {
        "IsOperational"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        match vehicle.state {
            VehicleState::Idle | VehicleState::Executing | VehicleState::Charging => Vec::new(),
            other => vec![format!("vehicle state {:?}", other)],
        }
    }
}

/// Either processing nothing, or processing an order it may give up.
pub struct IsFreeForOrder;

impl SelectionFilter<Vehicle> for IsFreeForOrder {
    fn name(&self) -> &'static str {
        "IsFreeForOrder"
    }

    fn apply(&self, vehicle: &Vehicle, ctx: &DispatchContext<'_>) -> Vec<String> {
        let processes_nothing = vehicle.proc_state == ProcState::Idle
            && vehicle.transport_order.is_none()
            && matches!(vehicle.state, VehicleState::Idle | VehicleState::Charging);
        if processes_nothing {
            return Vec::new();
        }
        let processes_dispensable = vehicle.proc_state == ProcState::ProcessingOrder
            && ctx
                .snapshot
                .order_of(vehicle)
                .is_some_and(|order| order.dispensable);
        if processes_dispensable {
            Vec::new()
        } else {
            vec![format!("processing state {:?}", vehicle.proc_state)]
        }
    }
}

/// A vehicle holding a reservation waits for that order.
pub struct HasNoHeldReservation;

impl SelectionFilter<Vehicle> for HasNoHeldReservation {
    fn name(&self) -> &'static str {
        "HasNoHeldReservation"
    }

    fn apply(&self, vehicle: &Vehicle, ctx: &DispatchContext<'_>) -> Vec<String> {
        ctx.reservations
            .held_by(&vehicle.name)
            .into_iter()
            .map(|order| format!("holds reservation on {}", order))
            .collect()
    }
}

/// Charging vehicles stay at the charger until sufficiently recharged; critical ones must recharge.
pub struct IsSufficientlyCharged;

impl SelectionFilter<Vehicle> for IsSufficientlyCharged {
    fn name(&self) -> &'static str {
        "IsSufficientlyCharged"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        if vehicle.state == VehicleState::Charging && !vehicle.is_sufficiently_recharged() {
            return vec![format!("charging, energy level {}", vehicle.energy_level)];
        }
        if vehicle.state != VehicleState::Charging && vehicle.is_energy_level_critical() {
            return vec![format!("energy level {} critical", vehicle.energy_level)];
        }
        Vec::new()
    }
}
