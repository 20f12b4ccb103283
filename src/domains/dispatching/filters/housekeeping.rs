use super::SelectionFilter;
use crate::domains::dispatching::positions::parking_priority;
use crate::domains::dispatching::DispatchContext;
use crate::domains::fleet::{ProcState, Vehicle, VehicleState};
use chrono::Duration;

pub struct IsIdle;

impl SelectionFilter<Vehicle> for IsIdle {
    fn name(&self) -> &'static str {
        "IsIdle"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        let mut reasons = Vec::new();
        if vehicle.state != VehicleState::Idle {
            reasons.push(format!("vehicle state {:?}", vehicle.state));
        }
        if vehicle.proc_state != ProcState::Idle || vehicle.transport_order.is_some() {
            reasons.push(format!("processing state {:?}", vehicle.proc_state));
        }
        reasons
    }
}

pub struct HasNoOrderSequence;

impl SelectionFilter<Vehicle> for HasNoOrderSequence {
    fn name(&self) -> &'static str {
        "HasNoOrderSequence"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        match &vehicle.order_sequence {
            Some(sequence) => vec![format!("bound to sequence {}", sequence)],
            None => Vec::new(),
        }
    }
}

pub struct IsNotParked {
    park_operation: String,
}

impl IsNotParked {
    pub fn new(park_operation: &str) -> Self {
        Self {
            park_operation: park_operation.to_string(),
        }
    }
}

impl SelectionFilter<Vehicle> for IsNotParked {
    fn name(&self) -> &'static str {
        "IsNotParked"
    }

    fn apply(&self, vehicle: &Vehicle, ctx: &DispatchContext<'_>) -> Vec<String> {
        match ctx.snapshot.location_at_vehicle(vehicle, &self.park_operation) {
            Some(location) => vec![format!("already parked at {}", location.name)],
            None => Vec::new(),
        }
    }
}

pub struct NeedsRecharge;

impl SelectionFilter<Vehicle> for NeedsRecharge {
    fn name(&self) -> &'static str {
        "NeedsRecharge"
    }

    fn apply(&self, vehicle: &Vehicle, _ctx: &DispatchContext<'_>) -> Vec<String> {
        if vehicle.is_energy_level_good() {
            vec![format!("energy level {} good", vehicle.energy_level)]
        } else {
            Vec::new()
        }
    }
}

pub struct IdleLongEnough {
    delay: Duration,
}

impl IdleLongEnough {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl SelectionFilter<Vehicle> for IdleLongEnough {
    fn name(&self) -> &'static str {
        "IdleLongEnough"
    }

    fn apply(&self, vehicle: &Vehicle, ctx: &DispatchContext<'_>) -> Vec<String> {
        if self.delay <= Duration::zero() {
            return Vec::new();
        }
        match vehicle.idle_since {
            Some(since) if ctx.now - since >= self.delay => Vec::new(),
            Some(since) => vec![format!("idle only since {}", since.to_rfc3339())],
            None => vec!["idle time unknown".to_string()],
        }
    }
}

/// Parked at a parking location while a location of better priority exists.
pub struct ParkedBelowTopPriority {
    park_operation: String,
}

impl ParkedBelowTopPriority {
    pub fn new(park_operation: &str) -> Self {
        Self {
            park_operation: park_operation.to_string(),
        }
    }
}

impl SelectionFilter<Vehicle> for ParkedBelowTopPriority {
    fn name(&self) -> &'static str {
        "ParkedBelowTopPriority"
    }

    fn apply(&self, vehicle: &Vehicle, ctx: &DispatchContext<'_>) -> Vec<String> {
        let model = &ctx.snapshot.model;
        let Some(current) = ctx.snapshot.location_at_vehicle(vehicle, &self.park_operation) else {
            return vec!["not parked".to_string()];
        };
        let current_priority = parking_priority(current);
        let best = model
            .locations_offering(&self.park_operation)
            .filter_map(parking_priority)
            .min();
        match (best, current_priority) {
            (Some(best), Some(current)) if best < current => Vec::new(),
            (Some(_), None) => Vec::new(),
            _ => vec![format!("parked at top priority location {}", current.name)],
        }
    }
}
